use colored::Colorize;

/// Usage text printed when `generate` is run without a version
pub fn show_usage() {
    println!();
    println!("{}", "== PHP Winget Manifest Builder ==".bold());
    println!();
    println!("{}", "Usage:".bold());
    println!("  generate [OPTIONS] <version> [ts|nts]");
    println!();
    println!("  <version>   PHP release line in N.N form, e.g. 8.3");
    println!("  ts|nts      Thread Safe (default) or Non Thread Safe build");
    println!();
    println!("{}", "Examples:".bold());
    println!("  generate 8.3");
    println!("  generate 8.3 nts");
    println!("  generate 8.4 --print-new-version --sentinel");
    println!("  generate 8.3 --index-file releases.json --output out/");
    println!();
    println!("Run {} for every option.", "generate --help".cyan());
    println!();
}
