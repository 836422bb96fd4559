use crate::core::{CredentialCheck, ProbeError, RegionCatalog};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::types::Filter;
use aws_sdk_s3::error::SdkError;

const GLOBAL_INFRA_PREFIX: &str = "/aws/service/global-infrastructure";

/// Region catalog backed by the public SSM parameters AWS publishes under
/// `/aws/service/global-infrastructure`, plus `DescribeAvailabilityZones`
/// issued through a region-scoped EC2 client. Read-only throughout.
#[derive(Debug)]
pub struct GlobalInfrastructureCatalog {
    ssm_client: aws_sdk_ssm::Client,
    sdk_config: SdkConfig,
}

impl GlobalInfrastructureCatalog {
    pub fn new(ssm_client: aws_sdk_ssm::Client, sdk_config: SdkConfig) -> Self {
        Self {
            ssm_client,
            sdk_config,
        }
    }

    /// All parameter values directly under `path`, following pagination.
    async fn parameter_values(&self, path: &str) -> Result<Vec<String>, String> {
        let mut values = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut request = self.ssm_client.get_parameters_by_path().path(path);
            if let Some(token) = next_token.take() {
                request = request.next_token(token);
            }
            let output = request
                .send()
                .await
                .map_err(|e| format!("GetParametersByPath on {path} failed: {e}"))?;

            for parameter in output.parameters() {
                if let Some(value) = parameter.value() {
                    values.push(value.to_string());
                }
            }

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(values)
    }

    async fn partition_of(&self, region: &str) -> Result<String, String> {
        let name = format!("{GLOBAL_INFRA_PREFIX}/regions/{region}/partition");
        let output = self
            .ssm_client
            .get_parameter()
            .name(&name)
            .send()
            .await
            .map_err(|e| format!("GetParameter on {name} failed: {e}"))?;

        output
            .parameter
            .and_then(|parameter| parameter.value)
            .ok_or_else(|| format!("{name} had no value"))
    }
}

#[async_trait]
impl RegionCatalog for GlobalInfrastructureCatalog {
    async fn partitions(&self) -> Result<Vec<String>, String> {
        tracing::debug!("listing partitions");
        self.parameter_values(&format!("{GLOBAL_INFRA_PREFIX}/partitions"))
            .await
    }

    async fn regions_for_service(
        &self,
        service: &str,
        partition: &str,
    ) -> Result<Vec<String>, String> {
        tracing::debug!(service, partition, "listing regions for service");
        let all = self
            .parameter_values(&format!("{GLOBAL_INFRA_PREFIX}/services/{service}/regions"))
            .await?;

        // The service listing is partition-agnostic; keep only the regions
        // that live in the requested partition.
        let mut regions = Vec::new();
        for region in all {
            if self.partition_of(&region).await? == partition {
                regions.push(region);
            }
        }

        Ok(regions)
    }

    async fn available_zone_count(&self, region: &str) -> Result<usize, String> {
        let ec2_config = aws_sdk_ec2::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        let ec2_client = aws_sdk_ec2::Client::from_conf(ec2_config);

        let output = ec2_client
            .describe_availability_zones()
            .filters(Filter::builder().name("state").values("available").build())
            .send()
            .await
            .map_err(|e| format!("unable to fetch the AZ list: {e}"))?;

        Ok(output.availability_zones().len())
    }
}

/// Credential probe: a bare `ListBuckets`, the cheapest read-only call that
/// exercises the whole signing path.
#[derive(Debug)]
pub struct S3CredentialCheck {
    s3_client: aws_sdk_s3::Client,
}

impl S3CredentialCheck {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

#[async_trait]
impl CredentialCheck for S3CredentialCheck {
    async fn verify(&self) -> Result<(), ProbeError> {
        match self.s3_client.list_buckets().send().await {
            Ok(_) => Ok(()),
            // The service saw the request and said no: credentials exist
            // but are not valid for even a ListBuckets.
            Err(SdkError::ServiceError(context)) => {
                Err(ProbeError::Unauthorized(format!("{:?}", context.err())))
            }
            // Requests that never made it out usually mean the default
            // chain found nothing to sign with.
            Err(err @ SdkError::DispatchFailure(_)) | Err(err @ SdkError::ConstructionFailure(_)) => {
                tracing::debug!(?err, "credential probe failed before dispatch");
                Err(ProbeError::NoCredentials)
            }
            Err(err) => Err(ProbeError::Api(err.to_string())),
        }
    }
}
