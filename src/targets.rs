#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetDir {
    pub dir_name: &'static str,
    pub description: &'static str,
}

pub const TARGET_DIRS: &[TargetDir] = &[
    // CMake / Visual Studio build output
    TargetDir {
        dir_name: "out",
        description: "Build output",
    },
    TargetDir {
        dir_name: ".vs",
        description: "Visual Studio cache",
    },
];

/// Looks up a directory base name in the target set. Exact, case-sensitive.
pub fn find_target(dir_name: &str) -> Option<&'static TargetDir> {
    TARGET_DIRS.iter().find(|t| t.dir_name == dir_name)
}

/// `out/ and .vs/`, for the completion line.
pub fn names_for_display() -> String {
    let names: Vec<String> = TARGET_DIRS.iter().map(|t| format!("{}/", t.dir_name)).collect();
    match names.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => String::new(),
    }
}
