//! Lookup of the font used for axis labels, titles and legends.
//!
//! Labels may contain CJK text, which Bevy's embedded default font cannot
//! render. The first call to [`label_font`] searches for SimHei, then
//! Microsoft YaHei, and caches the outcome for the rest of the process.
//! When neither is installed the renderer keeps the default font.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Environment variable naming an explicit font file; skips the search.
pub const FONT_ENV: &str = "FIGKIT_LABEL_FONT";

/// Families in order of preference, with the file names they ship as.
const CANDIDATES: [(&str, &[&str]); 2] = [
    ("SimHei", &["simhei.ttf"]),
    ("Microsoft YaHei", &["msyh.ttc", "msyh.ttf"]),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelFont {
    pub family: String,
    pub path: PathBuf,
}

impl LabelFont {
    /// Raw font bytes, or `None` when the file cannot be read.
    pub fn read(&self) -> Option<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read label font");
                None
            }
        }
    }
}

static LABEL_FONT: OnceLock<Option<LabelFont>> = OnceLock::new();

/// The cached label font; resolved on the first call.
pub fn label_font() -> Option<&'static LabelFont> {
    LABEL_FONT.get_or_init(resolve).as_ref()
}

fn resolve() -> Option<LabelFont> {
    if let Some(path) = std::env::var_os(FONT_ENV).map(PathBuf::from) {
        if path.is_file() {
            let family = path
                .file_stem()
                .and_then(OsStr::to_str)
                .unwrap_or("custom")
                .to_string();
            info!(%family, path = %path.display(), "label font taken from {FONT_ENV}");
            return Some(LabelFont { family, path });
        }
        warn!(path = %path.display(), "{FONT_ENV} is not a file, searching system fonts");
    }

    let found = find_in(&system_font_dirs());
    match &found {
        Some(font) => info!(family = %font.family, path = %font.path.display(), "label font found"),
        None => warn!("neither SimHei nor Microsoft YaHei found, labels use the default font"),
    }
    found
}

/// Search `dirs` recursively for the preferred families.
pub fn find_in(dirs: &[PathBuf]) -> Option<LabelFont> {
    let mut best: Option<(usize, PathBuf)> = None;
    for dir in dirs.iter().filter(|d| d.is_dir()) {
        let files = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());
        for entry in files {
            let Some(rank) = candidate_rank(entry.path()) else {
                continue;
            };
            if best.as_ref().is_none_or(|(r, _)| rank < *r) {
                best = Some((rank, entry.into_path()));
                if rank == 0 {
                    break;
                }
            }
        }
        if matches!(best, Some((0, _))) {
            break;
        }
    }
    best.map(|(rank, path)| LabelFont {
        family: CANDIDATES[rank].0.to_string(),
        path,
    })
}

fn candidate_rank(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    CANDIDATES
        .iter()
        .position(|(_, files)| files.contains(&name.as_str()))
}

fn system_font_dirs() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut dirs = Vec::new();
    if cfg!(target_os = "windows") {
        let root = std::env::var_os("WINDIR")
            .map_or_else(|| PathBuf::from(r"C:\Windows"), PathBuf::from);
        dirs.push(root.join("Fonts"));
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join(r"Microsoft\Windows\Fonts"));
        }
    } else if cfg!(target_os = "macos") {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        dirs.extend(home.map(|h| h.join("Library/Fonts")));
    } else {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Some(h) = home {
            dirs.push(h.join(".fonts"));
            dirs.push(h.join(".local/share/fonts"));
        }
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("figkit-fonts-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested")).unwrap();
        dir
    }

    #[test]
    fn prefers_simhei_over_yahei() {
        let dir = scratch("prefer");
        fs::write(dir.join("MSYH.TTC"), b"").unwrap();
        fs::write(dir.join("nested/simhei.ttf"), b"").unwrap();
        let font = find_in(&[dir.clone()]).unwrap();
        assert_eq!(font.family, "SimHei");
        assert_eq!(font.path, dir.join("nested/simhei.ttf"));
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn falls_back_to_yahei_then_nothing() {
        let dir = scratch("fallback");
        fs::write(dir.join("nested/msyh.ttf"), b"").unwrap();
        fs::write(dir.join("arial.ttf"), b"").unwrap();
        assert_eq!(find_in(&[dir.clone()]).unwrap().family, "Microsoft YaHei");

        fs::remove_file(dir.join("nested/msyh.ttf")).unwrap();
        assert_eq!(find_in(&[dir.clone(), dir.join("missing")]), None);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn ranks_by_file_name_only() {
        assert_eq!(candidate_rank(Path::new("/a/b/SimHei.TTF")), Some(0));
        assert_eq!(candidate_rank(Path::new("msyh.ttc")), Some(1));
        assert_eq!(candidate_rank(Path::new("simhei.ttf/other.otf")), None);
    }
}
