use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Human-readable size, `tree -h` style
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{}", bytes, UNITS[0])
    } else {
        format!("{:.1}{}", size, UNITS[unit])
    }
}

/// Tree of a directory with file sizes
pub fn render_listing(dir: &Path) -> Result<String> {
    let mut out = format!("{}\n", dir.display());
    render_children(dir, "", &mut out)?;
    Ok(out)
}

fn render_children(dir: &Path, prefix: &str, out: &mut String) -> Result<()> {
    let mut children: Vec<_> = std::fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
    children.sort_by_key(|entry| entry.file_name());

    let count = children.len();
    for (index, entry) in children.into_iter().enumerate() {
        let last = index + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        let metadata = entry.metadata()?;
        let name = entry.file_name().to_string_lossy().to_string();

        if metadata.is_dir() {
            writeln!(out, "{}{}{}/", prefix, branch, name)?;
            let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_children(&entry.path(), &nested, out)?;
        } else {
            writeln!(out, "{}{}[{:>6}]  {}", prefix, branch, format_size(metadata.len()), name)?;
        }
    }
    Ok(())
}

/// Delete a movie directory and everything in it
pub async fn remove_directory(dir: &Path) -> Result<()> {
    tokio::fs::remove_dir_all(dir).await?;
    info!("🗑️  Removed {}", dir.display());
    Ok(())
}
