use crate::core::{RegionPool, Selections};
use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::OnceLock;

/// One or more ASCII letters, digits, or hyphens. Compiled once.
fn prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^[a-z0-9-]+$").unwrap())
}

/// What the operator picked at the backup prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum BackupChoice {
    /// Option 0: run with the primary region only.
    NoBackup,
    /// 0-based index into the (primary-less) pool.
    Region(usize),
}

/// Reads one line, trimmed. `None` means the input stream is closed, which
/// every prompt treats as a clean abort.
fn read_trimmed_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_region_menu<W: Write>(
    out: &mut W,
    pool: &RegionPool,
    zero_option: Option<&str>,
) -> io::Result<()> {
    if let Some(label) = zero_option {
        writeln!(out, "\t0: {label}")?;
    }
    for (index, region) in pool.iter().enumerate() {
        writeln!(
            out,
            "\t{}: {} in the {} partition",
            index + 1,
            region,
            pool.partition_of(region).unwrap_or("unknown")
        )?;
    }
    Ok(())
}

/// Numbered-menu selection of the primary region. Returns the 0-based pool
/// index, or `None` when the input stream closes.
pub fn select_primary<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    pool: &RegionPool,
) -> io::Result<Option<usize>> {
    writeln!(out, "The following regions are available for bootstrapping:")?;
    print_region_menu(out, pool, None)?;

    loop {
        write!(out, "Please choose a region for your primary region: ")?;
        out.flush()?;

        let line = match read_trimmed_line(input)? {
            Some(line) => line,
            None => return Ok(None),
        };

        match line.parse::<usize>() {
            Ok(choice) if (1..=pool.len()).contains(&choice) => {
                let region = pool.get(choice - 1).unwrap_or_default();
                writeln!(out, "Using region {region} as the primary region.")?;
                return Ok(Some(choice - 1));
            }
            _ => writeln!(
                out,
                "You entered an invalid number.  \
                 Try again, or use Control-D (on Windows, Control-Z) to exit."
            )?,
        }
    }
}

/// Backup-region selection over the pool that remains after the primary was
/// removed. `0` means "no backup region".
pub fn select_backup<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    pool: &RegionPool,
) -> io::Result<Option<BackupChoice>> {
    writeln!(
        out,
        "\nYou have the option of placing standby infrastructure in a second \
         region, to be used as a backup.\n\
         \n\
         Only the pieces needed to keep existing systems running are \
         replicated there; ancillary items stay in the primary region.  A \
         region-wide outage of the primary would block enrolling new systems \
         and pushing new code, but systems already running keep working \
         against the backup.\n\
         \n\
         The following regions qualify as a backup region:"
    )?;
    print_region_menu(out, pool, Some("No backup region"))?;

    loop {
        write!(out, "Please choose a region for your backup region: ")?;
        out.flush()?;

        let line = match read_trimmed_line(input)? {
            Some(line) => line,
            None => return Ok(None),
        };

        match line.parse::<usize>() {
            Ok(0) => {
                writeln!(out, "Not using a backup region.")?;
                return Ok(Some(BackupChoice::NoBackup));
            }
            Ok(choice) if choice <= pool.len() => {
                let region = pool.get(choice - 1).unwrap_or_default();
                writeln!(out, "Using region {region} as the backup region.")?;
                return Ok(Some(BackupChoice::Region(choice - 1)));
            }
            _ => writeln!(
                out,
                "You entered an invalid number.  \
                 Try again, or use Control-D (on Windows, Control-Z) to exit."
            )?,
        }
    }
}

/// Prompts until the operator enters a valid bucket prefix: one or more
/// ASCII letters, digits, or hyphens.
pub fn read_bucket_prefix<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
) -> io::Result<Option<String>> {
    writeln!(
        out,
        "\nNext we need a prefix for naming S3 buckets.  The provisioning \
         step derives bucket names from it, so it must contain only letters, \
         digits, and hyphens.  Note that we do not check whether the \
         resulting bucket names are globally unique."
    )?;

    loop {
        write!(out, "Please enter a bucket prefix: ")?;
        out.flush()?;

        let line = match read_trimmed_line(input)? {
            Some(line) => line,
            None => return Ok(None),
        };

        if prefix_pattern().is_match(&line) {
            return Ok(Some(line));
        }
        writeln!(
            out,
            "A bucket prefix may only contain letters, digits, and hyphens, \
             and may not be empty.  Try again."
        )?;
    }
}

/// Shows the collected values and waits for an explicit keypress. Returns
/// `false` when the input stream closes, in which case nothing is written.
pub fn review_and_confirm<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    selections: &Selections,
) -> io::Result<bool> {
    writeln!(
        out,
        "\nHere is what will be written:\n\
         \tPrimary region: {}\n\
         \tBackup region:  {}\n\
         \tBucket prefix:  {}",
        selections.home_region, selections.remote_region, selections.bucket_prefix
    )?;
    writeln!(
        out,
        "Variables for the domain, admin email, SSH key, and spot bootstrap \
         are not implemented yet and will not be written."
    )?;
    write!(out, "Press Enter to continue, or Control-C to abort: ")?;
    out.flush()?;

    Ok(read_trimmed_line(input)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Cursor;

    fn pool(regions: &[&str]) -> RegionPool {
        let partitions = regions
            .iter()
            .map(|r| (r.to_string(), "aws".to_string()))
            .collect::<HashMap<_, _>>();
        RegionPool::new(regions.iter().map(|r| r.to_string()).collect(), partitions)
    }

    fn selections() -> Selections {
        Selections {
            home_region: "us-east-1".to_string(),
            remote_region: "none".to_string(),
            bucket_prefix: "acme-prod".to_string(),
        }
    }

    #[test]
    fn primary_menu_is_one_indexed_and_annotated_with_partitions() {
        let pool = pool(&["us-east-1", "eu-west-1"]);
        let mut out = Vec::new();

        let choice = select_primary(&mut Cursor::new("2\n"), &mut out, &pool).unwrap();

        assert_eq!(choice, Some(1));
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("\t1: us-east-1 in the aws partition\n"));
        assert!(transcript.contains("\t2: eu-west-1 in the aws partition\n"));
        assert!(transcript.contains("Using region eu-west-1 as the primary region."));
    }

    #[test]
    fn primary_reprompts_on_garbage_and_out_of_range_input() {
        let pool = pool(&["us-east-1", "eu-west-1"]);
        let mut out = Vec::new();

        let choice =
            select_primary(&mut Cursor::new("potato\n7\n0\n1\n"), &mut out, &pool).unwrap();

        assert_eq!(choice, Some(0));
        let transcript = String::from_utf8(out).unwrap();
        assert_eq!(transcript.matches("invalid number").count(), 3);
    }

    #[test]
    fn primary_returns_none_when_input_closes() {
        let pool = pool(&["us-east-1"]);
        let mut out = Vec::new();

        let choice = select_primary(&mut Cursor::new(""), &mut out, &pool).unwrap();

        assert_eq!(choice, None);
    }

    #[test]
    fn backup_zero_always_means_no_backup() {
        let mut out = Vec::new();

        let choice = select_backup(&mut Cursor::new("0\n"), &mut out, &pool(&["eu-west-1"]))
            .unwrap();
        assert_eq!(choice, Some(BackupChoice::NoBackup));

        // Same answer against an empty pool, where 0 is the only option.
        let mut out = Vec::new();
        let choice = select_backup(&mut Cursor::new("0\n"), &mut out, &pool(&[])).unwrap();
        assert_eq!(choice, Some(BackupChoice::NoBackup));
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("\t0: No backup region\n"));
    }

    #[test]
    fn backup_region_choice_maps_to_pool_index() {
        let pool = pool(&["eu-west-1", "ap-southeast-2"]);
        let mut out = Vec::new();

        let choice = select_backup(&mut Cursor::new("2\n"), &mut out, &pool).unwrap();

        assert_eq!(choice, Some(BackupChoice::Region(1)));
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Using region ap-southeast-2 as the backup region."));
    }

    #[test]
    fn bucket_prefix_accepts_letters_digits_and_hyphens() {
        for valid in ["my-bucket-01", "ABC123"] {
            let mut out = Vec::new();
            let prefix =
                read_bucket_prefix(&mut Cursor::new(format!("{valid}\n")), &mut out).unwrap();
            assert_eq!(prefix.as_deref(), Some(valid));
        }
    }

    #[test]
    fn bucket_prefix_rejects_until_input_is_valid() {
        let mut out = Vec::new();

        let prefix = read_bucket_prefix(
            &mut Cursor::new("my_bucket\nmy bucket\n\nacme-prod\n"),
            &mut out,
        )
        .unwrap();

        assert_eq!(prefix.as_deref(), Some("acme-prod"));
        let transcript = String::from_utf8(out).unwrap();
        assert_eq!(transcript.matches("Try again.").count(), 3);
    }

    #[test]
    fn bucket_prefix_returns_none_when_input_closes() {
        let mut out = Vec::new();

        let prefix = read_bucket_prefix(&mut Cursor::new("my_bucket\n"), &mut out).unwrap();

        // One rejection, then EOF.
        assert_eq!(prefix, None);
    }

    #[test]
    fn review_confirms_on_keypress_and_aborts_on_eof() {
        let mut out = Vec::new();
        assert!(review_and_confirm(&mut Cursor::new("\n"), &mut out, &selections()).unwrap());

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Primary region: us-east-1"));
        assert!(transcript.contains("not implemented yet"));

        let mut out = Vec::new();
        assert!(!review_and_confirm(&mut Cursor::new(""), &mut out, &selections()).unwrap());
    }
}
