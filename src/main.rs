use crate::adapters::{GlobalInfrastructureCatalog, S3CredentialCheck};
use crate::configuration::Configuration;
use crate::core::{
    CredentialCheck, ProbeError, RegionFinder, Selections, ZoneCheck, REQUIRED_SERVICES,
};
use crate::prompt::BackupChoice;
use anyhow::Context;
use std::io;
use tracing_subscriber::EnvFilter;

mod adapters;
mod configuration;
mod core;
mod prompt;
mod vars;

const GREETING: &str = "\
Hello!  This is the bootstrap setup assistant!

It is an optional helper that picks the right variables to hand to the
provisioning step.  Although it talks to AWS, it makes no changes: it only
reads data about the environments you can access, and checks that your
credentials work.

Let's get started!
";

fn print_probe_remediation(error: &ProbeError) {
    eprintln!("{error}");
    match error {
        ProbeError::NoCredentials => eprintln!(
            "To load credentials, set AWS_ACCESS_KEY_ID and \
             AWS_SECRET_ACCESS_KEY, or configure a profile in \
             ~/.aws/credentials (see the AWS SDK configuration guide).\n\
             Once you're done, come back here and try again!"
        ),
        ProbeError::Unauthorized(_) => eprintln!(
            "Even with the credentials you have, a simple \"list buckets\" \
             call did not go through.  Please check that your credentials \
             are valid and not expired, then try again!"
        ),
        ProbeError::Api(_) => eprintln!(
            "The credential check could not reach AWS.  Check your network \
             and SDK configuration, then try again!"
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Diagnostics stay on stderr at warn level by default so they never
    // interleave with the interactive transcript.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Control-C at any prompt is a clean abort, same as end-of-input:
    // print the blank line the interrupted prompt would have produced and
    // exit 0 with nothing written.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!();
            std::process::exit(0);
        }
    });

    println!("{GREETING}");

    let config = Configuration::load();

    println!("First, we'll check whether you have valid AWS credentials...");
    let sdk_config = aws_config::load_from_env().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .region(aws_sdk_s3::config::Region::new(config.probe_region.clone()))
        .build();
    let probe = S3CredentialCheck::new(aws_sdk_s3::Client::from_conf(s3_config));
    if let Err(error) = probe.verify().await {
        print_probe_remediation(&error);
        std::process::exit(1);
    }
    println!("Your credentials look good!\n");

    let catalog =
        GlobalInfrastructureCatalog::new(aws_sdk_ssm::Client::new(&sdk_config), sdk_config);
    let finder = RegionFinder::new(catalog);

    println!(
        "Looking for regions that support: {}",
        REQUIRED_SERVICES.join(", ")
    );
    let mut pool = match finder.discover(&REQUIRED_SERVICES).await {
        Ok(pool) => pool,
        Err(reason) => {
            eprintln!("Could not enumerate regions: {reason}");
            std::process::exit(1);
        }
    };

    println!("Filtering out regions with fewer than three usable AZs:");
    let report = finder.qualify(&mut pool).await;
    for (region, check) in &report {
        match check {
            ZoneCheck::Qualified(count) => println!("{region}: OK, {count} AZs"),
            ZoneCheck::TooFew(count) => {
                println!("{region}: BAD: only {count} available AZs")
            }
            ZoneCheck::Failed(reason) => println!(
                "{region}: BAD: {reason}.  Maybe you can't access this partition?"
            ),
        }
    }
    println!();

    if pool.is_empty() {
        eprintln!("No region supports every required service with three usable AZs.");
        std::process::exit(1);
    }

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let primary_index = match prompt::select_primary(&mut input, &mut out, &pool)? {
        Some(index) => index,
        None => {
            println!();
            return Ok(());
        }
    };
    let home_region = pool
        .remove(primary_index)
        .context("selected region was not in the pool")?;

    let backup = match prompt::select_backup(&mut input, &mut out, &pool)? {
        Some(choice) => choice,
        None => {
            println!();
            return Ok(());
        }
    };
    let remote_region = match backup {
        BackupChoice::NoBackup => "none".to_string(),
        BackupChoice::Region(index) => pool
            .get(index)
            .context("selected backup region was not in the pool")?
            .to_string(),
    };

    let bucket_prefix = match prompt::read_bucket_prefix(&mut input, &mut out)? {
        Some(prefix) => prefix,
        None => {
            println!();
            return Ok(());
        }
    };

    let selections = Selections {
        home_region,
        remote_region,
        bucket_prefix,
    };

    if !prompt::review_and_confirm(&mut input, &mut out, &selections)? {
        println!();
        return Ok(());
    }
    println!();

    vars::persist(&config.output_file, &selections, &mut input, &mut out)
        .context("failed to write the variables")?;

    Ok(())
}
