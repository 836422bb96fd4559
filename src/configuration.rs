use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Ambient settings. Everything has a working default; the environment can
/// override individual values with a `BOOTSTRAP_` prefix (for example
/// `BOOTSTRAP_OUTPUT_FILE=vars.tfvars`).
#[derive(Debug, Serialize, Deserialize)]
pub struct Configuration {
    /// Where the chosen variables get written.
    pub output_file: String,
    /// Region used for the credential probe; ListBuckets works from any
    /// region, this just gives the client an endpoint.
    pub probe_region: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            output_file: "terraform.tfvars".to_string(),
            probe_region: "us-east-1".to_string(),
        }
    }
}

impl Configuration {
    pub fn load() -> Self {
        let config = Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Env::prefixed("BOOTSTRAP_"))
            .extract();

        match config {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load configuration, using defaults");
                Configuration::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        figment::Jail::expect_with(|_jail| {
            let config = Configuration::load();

            assert_eq!(config.output_file, "terraform.tfvars");
            assert_eq!(config.probe_region, "us-east-1");

            Ok(())
        });
    }

    #[test]
    fn environment_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BOOTSTRAP_OUTPUT_FILE", "custom.tfvars");

            let config = Configuration::load();

            assert_eq!(config.output_file, "custom.tfvars");
            assert_eq!(config.probe_region, "us-east-1");

            Ok(())
        });
    }
}
