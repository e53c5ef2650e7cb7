use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::services::report_service::SortKey;
use crate::services::resolve_service::ResolverKind;

/// List the files an npm package would publish, with their sizes.
#[derive(Debug, Clone, Parser)]
#[command(name = "pkgfiles", version, author)]
pub struct Args {
    /// Package directory (defaults to the current directory)
    pub dir: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long, conflicts_with = "list")]
    pub json: bool,

    /// Only list the published file paths
    #[arg(long)]
    pub list: bool,

    /// Sort entries by `name` or `size`
    #[arg(long, value_name = "KEY", default_value_t = SortKey::Name)]
    pub sort: SortKey,

    /// Show directories and files in separate sections
    #[arg(long)]
    pub split: bool,

    /// Add disk-size columns
    #[arg(long)]
    pub disk: bool,

    /// How published files are resolved: `auto`, `npm` or `builtin`
    /// [env: PKGFILES_RESOLVER]
    #[arg(long, value_name = "KIND")]
    pub resolver: Option<ResolverKind>,

    /// Maximum number of files stat'd at once [env: PKGFILES_CONCURRENCY]
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["pkgfiles"]).unwrap();
        assert!(args.dir.is_none());
        assert_eq!(args.sort, SortKey::Name);
        assert!(!args.json && !args.list && !args.split && !args.disk);
        assert!(args.resolver.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn parses_all_flags() {
        let args = Args::try_parse_from([
            "pkgfiles",
            "./mypkg",
            "--sort",
            "size",
            "--split",
            "--disk",
            "--resolver",
            "builtin",
            "--concurrency",
            "8",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.dir, Some(PathBuf::from("./mypkg")));
        assert_eq!(args.sort, SortKey::Size);
        assert!(args.split && args.disk);
        assert_eq!(args.resolver, Some(ResolverKind::Builtin));
        assert_eq!(args.concurrency, Some(8));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn rejects_unknown_values_and_conflicts() {
        assert!(Args::try_parse_from(["pkgfiles", "--sort", "date"]).is_err());
        assert!(Args::try_parse_from(["pkgfiles", "--resolver", "yarn"]).is_err());
        assert!(Args::try_parse_from(["pkgfiles", "--json", "--list"]).is_err());
    }
}
