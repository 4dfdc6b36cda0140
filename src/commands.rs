//! # Container Commands
//!
//! One function per `stego` subcommand. Each opens the container in a scope so that the
//! image is re-encoded on the way out whenever the command changed it.

use anyhow::Result;
use log::info;
use std::path::Path;

use crate::common::content::{bytes_str, group_thousands, read_byte_content, write_byte_content};
use crate::stego::{Container, ContainerInfo, OpenOptions, Strategy, Validation};

/// Turn an image into an empty container.
pub fn initialize(file_path: &Path, options: &OpenOptions, force: bool) -> Result<()> {
    let options = OpenOptions {
        initialize: true,
        force,
        ..*options
    };
    Container::scoped(file_path, &options, |_| Ok(()))
}

pub fn validate(file_path: &Path, options: &OpenOptions, header_only: bool) -> Result<Validation> {
    Container::scoped(file_path, options, |c| Ok(c.validate(header_only)?))
}

/// Dump the payload to `out_file` (`-` for stdout).
pub fn cat(file_path: &Path, options: &OpenOptions, out_file: &str) -> Result<()> {
    Container::scoped(file_path, options, |c| {
        let payload = c.read(None)?;
        write_byte_content(out_file, &payload)?;
        Ok(())
    })
}

/// Replace the payload with `data` (`-` for stdin, a file path, or literal text).
pub fn write(file_path: &Path, options: &OpenOptions, data: &str) -> Result<()> {
    let payload = read_byte_content(data)?;
    Container::scoped(file_path, options, |c| {
        c.write(&payload)?;
        info!("Wrote {} to {}", bytes_str(payload.len()), file_path.display());
        Ok(())
    })
}

pub fn format(file_path: &Path, options: &OpenOptions, strategy: Strategy) -> Result<()> {
    Container::scoped(file_path, options, |c| {
        let mut source = strategy.source();
        c.format(source.as_mut())?;
        Ok(())
    })
}

pub fn info(file_path: &Path, options: &OpenOptions, json: bool) -> Result<ContainerInfo> {
    let info = Container::scoped(file_path, options, |c| Ok::<_, anyhow::Error>(c.info()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render_info(&info));
    }
    Ok(info)
}

/// Two-column text table for [`ContainerInfo`].
pub fn render_info(info: &ContainerInfo) -> String {
    let na = |s: String| if info.valid { s } else { "n/a".to_string() };
    let rows = [
        ("Header", (if info.valid { "valid" } else { "invalid" }).to_string()),
        (
            "Dimensions",
            format!(
                "{} px X {} px",
                group_thousands(info.height as usize),
                group_thousands(info.width as usize)
            ),
        ),
        ("Capacity", bytes_str(info.capacity)),
        (
            "Used",
            na(format!("{} ({:.0}%)", bytes_str(info.used), info.used_percent)),
        ),
        (
            "Channel LSBs",
            format!("{} x {}", group_thousands(info.samples), info.lsb),
        ),
        ("Checksum", na(info.checksum.clone())),
        ("Reserved bits", na(info.reserved.clone())),
        (
            "Header end",
            info.header_end.map_or_else(|| "n/a".to_string(), |end| end.to_string()),
        ),
        ("Visual integrity", format!("{:.2}%", info.visual_integrity)),
    ];

    let mut out = format!("{}\n", info.path);
    for (label, value) in rows {
        out.push_str(&format!("  {:<18}{}\n", label, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info(valid: bool) -> ContainerInfo {
        ContainerInfo {
            path: "img.png".to_string(),
            valid,
            width: 1920,
            height: 1080,
            capacity: 1_555_186,
            used: 1536,
            used_percent: 0.1,
            samples: 6_220_800,
            lsb: 2,
            checksum: "deadbeef".to_string(),
            reserved: "00000000".to_string(),
            header_end: valid.then_some(14),
            visual_integrity: 99.99,
        }
    }

    #[test]
    fn test_render_info() {
        let table = render_info(&sample_info(true));
        assert!(table.starts_with("img.png\n"));
        assert!(table.contains("1,080 px X 1,920 px"));
        assert!(table.contains("1.50 kb (0%)"));
        assert!(table.contains("6,220,800 x 2"));
        assert!(table.contains("deadbeef"));
        assert!(table.contains("99.99%"));
    }

    #[test]
    fn test_render_invalid_info() {
        let table = render_info(&sample_info(false));
        assert!(table.contains("invalid"));
        assert!(!table.contains("deadbeef"));
        assert!(table.contains("Header end        n/a"));
    }
}
