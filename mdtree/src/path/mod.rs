// Path algebra - POSIX-flavored join/normalize/relative/resolve over string paths.
// No I/O: backends and the reference layer all address documents through this.

/// String path manipulation with a configurable separator.
///
/// Every operation has a provided implementation built on [`separator`] and
/// [`cwd`], so an implementation only decides those two things.
///
/// [`separator`]: PathSystem::separator
/// [`cwd`]: PathSystem::cwd
pub trait PathSystem: Send + Sync {
    /// The segment separator.
    fn separator(&self) -> char;

    /// The directory `resolve` starts from when every part is relative.
    fn cwd(&self) -> String;

    /// Join non-empty parts with the separator, then normalize.
    /// Zero (or only empty) parts yield `"."`.
    fn join(&self, parts: &[&str]) -> String {
        let sep = self.separator().to_string();
        let joined = parts
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(&sep);
        if joined.is_empty() {
            return ".".to_string();
        }
        self.normalize(&joined)
    }

    /// Last path segment, with `ext` stripped when it is a proper suffix.
    fn basename(&self, path: &str, ext: Option<&str>) -> String {
        let sep = self.separator();
        let trimmed = path.trim_end_matches(sep);
        let segment = match trimmed.rfind(sep) {
            Some(idx) => &trimmed[idx + sep.len_utf8()..],
            None => trimmed,
        };
        match ext {
            Some(ext) if !ext.is_empty() && segment.len() > ext.len() && segment.ends_with(ext) => {
                segment[..segment.len() - ext.len()].to_string()
            }
            _ => segment.to_string(),
        }
    }

    /// The path minus its last segment.
    ///
    /// A path with no separator, or whose only separator is the leading one,
    /// yields `"."`. The absolute root is not preserved: `dirname("/")` and
    /// `dirname("/docs")` are both `"."`.
    fn dirname(&self, path: &str) -> String {
        let sep = self.separator();
        let trimmed = path.trim_end_matches(sep);
        match trimmed.rfind(sep) {
            None | Some(0) => ".".to_string(),
            Some(idx) => trimmed[..idx].to_string(),
        }
    }

    /// Extension of the final segment including the dot.
    /// Dotfiles and names without a dot have none; `"file."` yields `"."`.
    fn extname(&self, path: &str) -> String {
        let base = self.basename(path, None);
        if base == ".." {
            return String::new();
        }
        match base.rfind('.') {
            None | Some(0) => String::new(),
            Some(idx) => base[idx..].to_string(),
        }
    }

    fn is_absolute(&self, path: &str) -> bool {
        path.starts_with(self.separator())
    }

    /// Collapse `.`, repeated separators, and `..` against preceding real
    /// segments. Leading `..` of a relative path are kept; an absolute path
    /// never climbs above its root.
    fn normalize(&self, path: &str) -> String {
        if path.is_empty() {
            return ".".to_string();
        }
        let sep = self.separator();
        let absolute = self.is_absolute(path);

        let mut stack: Vec<&str> = Vec::new();
        for segment in path.split(sep) {
            match segment {
                "" | "." => {}
                ".." => match stack.last() {
                    Some(last) if *last != ".." => {
                        stack.pop();
                    }
                    _ if absolute => {}
                    _ => stack.push(".."),
                },
                other => stack.push(other),
            }
        }

        let body = stack.join(&sep.to_string());
        match (absolute, body.is_empty()) {
            (true, _) => format!("{sep}{body}"),
            (false, true) => ".".to_string(),
            (false, false) => body,
        }
    }

    /// Accumulate parts left to right; an absolute part replaces everything
    /// before it. A still-relative result is anchored at [`cwd`](PathSystem::cwd).
    fn resolve(&self, parts: &[&str]) -> String {
        let sep = self.separator();
        let mut acc = String::new();
        for part in parts.iter().filter(|p| !p.is_empty()) {
            if self.is_absolute(part) || acc.is_empty() {
                acc = part.to_string();
            } else {
                acc.push(sep);
                acc.push_str(part);
            }
        }
        if acc.is_empty() {
            return ".".to_string();
        }
        if !self.is_absolute(&acc) {
            acc = format!("{}{sep}{acc}", self.cwd());
        }
        self.normalize(&acc)
    }

    /// Path from `from` to `to`: `..` up to the common ancestor, then down.
    fn relative(&self, from: &str, to: &str) -> String {
        let sep = self.separator();
        let from = self.resolve(&[from]);
        let to = self.resolve(&[to]);
        if from == to {
            return ".".to_string();
        }

        let from_segments: Vec<&str> = from.split(sep).filter(|s| !s.is_empty()).collect();
        let to_segments: Vec<&str> = to.split(sep).filter(|s| !s.is_empty()).collect();
        let common = from_segments
            .iter()
            .zip(&to_segments)
            .take_while(|(a, b)| a == b)
            .count();

        let mut out: Vec<&str> = vec![".."; from_segments.len() - common];
        out.extend(&to_segments[common..]);
        if out.is_empty() {
            return ".".to_string();
        }
        out.join(&sep.to_string())
    }
}

/// Path system for the host: `/` separator, process working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixPathSystem;

impl PathSystem for PosixPathSystem {
    fn separator(&self) -> char {
        '/'
    }

    fn cwd(&self) -> String {
        std::env::current_dir()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| "/".to_string())
    }
}

/// Deterministic path system for tests: fixed separator and working directory.
#[derive(Debug, Clone)]
pub struct MockPathSystem {
    separator: char,
    cwd: String,
}

impl MockPathSystem {
    pub fn new(separator: char, cwd: impl Into<String>) -> Self {
        MockPathSystem {
            separator,
            cwd: cwd.into(),
        }
    }
}

impl Default for MockPathSystem {
    fn default() -> Self {
        MockPathSystem::new('/', "/workspace")
    }
}

impl PathSystem for MockPathSystem {
    fn separator(&self) -> char {
        self.separator
    }

    fn cwd(&self) -> String {
        self.cwd.clone()
    }
}
