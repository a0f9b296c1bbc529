use compact_str::CompactString;

/// Turns user input into a namespaced project path (`group/sub/project`).
///
/// Accepts bare paths, web or clone URLs (`https://host/group/project.git`),
/// scp-style clone addresses (`git@host:group/project.git`) and links to
/// project sub-pages (`.../group/project/-/issues/7`). Returns `None` when
/// nothing is left after normalization.
pub fn normalize_project_path(input: &str) -> Option<CompactString> {
    let input = input.trim();

    let path = if let Some(rest) = strip_scheme(input) {
        // drop the host, keep the path; query and fragment never name a project
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        rest.find('/').map(|idx| &rest[idx..]).unwrap_or_default()
    } else if let Some((_, path)) = input.split_once(':').filter(|(host, _)| host.contains('@')) {
        path
    } else {
        input
    };

    let path = path.split("/-/").next().unwrap_or_default();
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let path = path.trim_start_matches('/').trim_end_matches('/');

    (!path.is_empty()).then(|| path.into())
}

fn strip_scheme(input: &str) -> Option<&str> {
    ["https://", "http://"].iter().find_map(|scheme| {
        input
            .get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| &input[scheme.len()..])
    })
}
