use std::{fs, io, path::Path};

/// Lista de URLs: una por línea, sin espacios alrededor y sin líneas vacías.
/// Los duplicados se conservan; cada aparición se descarga y se cuenta.
pub fn parse_urls(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_urls(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_urls(&content))
}
