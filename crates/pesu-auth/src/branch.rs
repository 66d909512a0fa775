//! Static branch name to short code table.

/// Known branch names as printed by the portal, with their acronyms.
pub const BRANCH_SHORT_CODES: &[(&str, &str)] = &[
    ("Computer Science and Engineering", "CSE"),
    ("Computer Science and Engineering (AI&ML)", "CSE (AI&ML)"),
    ("Electronics and Communication Engineering", "ECE"),
    ("Mechanical Engineering", "ME"),
    ("Electrical and Electronics Engineering", "EEE"),
    ("Civil Engineering", "CE"),
    ("Biotechnology", "BT"),
    ("Bachelor of Computer Applications", "BCA"),
    ("BA LLB", "BA LLB"),
    ("Psychology", "Psychology"),
    ("Bachelor of Business Administration", "BBA"),
];

/// Look up the short code for a branch name. Matching is exact.
pub fn branch_short_code(branch: &str) -> Option<&'static str> {
    BRANCH_SHORT_CODES
        .iter()
        .find(|(name, _)| *name == branch)
        .map(|(_, code)| *code)
}
