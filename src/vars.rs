use crate::core::Selections;
use std::fs::File;
use std::io::{self, BufRead, Write};

/// One `key = "value"` line per variable, in the order the provisioning
/// step expects them. The stdout fallback reuses this, so the two outputs
/// are byte-identical.
pub fn render<W: Write>(mut writer: W, selections: &Selections) -> io::Result<()> {
    writeln!(writer, "home_region = \"{}\"", selections.home_region)?;
    writeln!(writer, "remote_region = \"{}\"", selections.remote_region)?;
    writeln!(writer, "bucket_prefix = \"{}\"", selections.bucket_prefix)
}

/// Write the variables file at `path`. When the file cannot be opened the
/// operator is offered the choice of printing the same lines to `out`
/// instead; closing the input stream at that point aborts with nothing
/// emitted. Returns whether anything was written.
pub fn persist<R: BufRead, W: Write>(
    path: &str,
    selections: &Selections,
    input: &mut R,
    out: &mut W,
) -> io::Result<bool> {
    match File::create(path) {
        Ok(mut file) => {
            render(&mut file, selections)?;
            writeln!(out, "Wrote {path}.")?;
            Ok(true)
        }
        Err(e) => {
            writeln!(out, "Could not open {path} for writing: {e}")?;
            write!(
                out,
                "Press Enter to print the variables to standard output \
                 instead, or Control-C to abort: "
            )?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(false);
            }

            render(&mut *out, selections)?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn selections() -> Selections {
        Selections {
            home_region: "B".to_string(),
            remote_region: "none".to_string(),
            bucket_prefix: "acme-prod".to_string(),
        }
    }

    #[test]
    fn renders_the_three_keys_in_fixed_order() {
        let mut rendered = Vec::new();

        render(&mut rendered, &selections()).unwrap();

        assert_eq!(
            String::from_utf8(rendered).unwrap(),
            "home_region = \"B\"\nremote_region = \"none\"\nbucket_prefix = \"acme-prod\"\n"
        );
    }

    #[test]
    fn persists_to_the_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraform.tfvars");
        let mut out = Vec::new();

        let written = persist(
            path.to_str().unwrap(),
            &selections(),
            &mut Cursor::new(""),
            &mut out,
        )
        .unwrap();

        assert!(written);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "home_region = \"B\"\nremote_region = \"none\"\nbucket_prefix = \"acme-prod\"\n"
        );
    }

    #[test]
    fn falls_back_to_stdout_when_the_file_cannot_be_opened() {
        let mut out = Vec::new();

        let written = persist(
            "/nonexistent-dir/terraform.tfvars",
            &selections(),
            &mut Cursor::new("\n"),
            &mut out,
        )
        .unwrap();

        assert!(written);
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("Could not open /nonexistent-dir/terraform.tfvars"));
        assert!(transcript.ends_with(
            "home_region = \"B\"\nremote_region = \"none\"\nbucket_prefix = \"acme-prod\"\n"
        ));
    }

    #[test]
    fn fallback_abort_emits_nothing() {
        let mut out = Vec::new();

        let written = persist(
            "/nonexistent-dir/terraform.tfvars",
            &selections(),
            &mut Cursor::new(""),
            &mut out,
        )
        .unwrap();

        assert!(!written);
        let transcript = String::from_utf8(out).unwrap();
        assert!(!transcript.contains("home_region"));
    }
}
