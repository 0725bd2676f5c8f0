use crate::CaseSensitivity;
use std::path::{Component, Path, PathBuf};

/// Replaces a leading `~` component with `home`.
///
/// `~user` forms are not expanded and stay relative.
pub fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let mut components = path.components();
    match (components.next(), home) {
        (Some(Component::Normal(first)), Some(home)) if first == "~" => {
            let rest = components.as_path();
            if rest.as_os_str().is_empty() {
                home.to_path_buf()
            } else {
                home.join(rest)
            }
        }
        _ => path.to_path_buf(),
    }
}

/// Segment-wise prefix test: `/a/b` contains `/a/b/c` but not `/a/bc`.
pub fn path_starts_with(path: &Path, root: &Path, case: CaseSensitivity) -> bool {
    match case {
        CaseSensitivity::Sensitive => path.starts_with(root),
        CaseSensitivity::Insensitive => {
            let mut candidate = path.components();
            root.components().all(|root_component| {
                candidate
                    .next()
                    .is_some_and(|component| fold(component) == fold(root_component))
            })
        }
    }
}

pub fn is_under_any_root(path: &Path, roots: &[PathBuf], case: CaseSensitivity) -> bool {
    roots.iter().any(|root| path_starts_with(path, root, case))
}

fn fold(component: Component<'_>) -> String {
    component.as_os_str().to_string_lossy().to_lowercase()
}
