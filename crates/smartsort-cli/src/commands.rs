use clap::{Args, Parser, Subcommand};
use smartsort_core::Category;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "smartsort")]
#[command(
    about = "Sort a folder by file type, find duplicates and build face albums",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy or move files into category folders
    Sort(SortArgs),
    /// Report groups of identical files
    Duplicates(DuplicateArgs),
    /// Group photos into one album per person under Faces/
    Faces {
        /// Folder to analyse
        dir: PathBuf,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct SortArgs {
    /// Folder to organise
    pub dir: PathBuf,
    /// Include files in subfolders
    #[arg(long)]
    pub recursive: bool,
    /// Move files instead of copying them
    #[arg(long = "move")]
    pub move_files: bool,
    /// Do not group photos into year/month folders
    #[arg(long)]
    pub no_date_folders: bool,
    /// Restrict sorting to these categories; everything else goes to Others
    #[arg(long = "category", value_name = "C")]
    pub categories: Vec<Category>,
}

#[derive(Debug, Args)]
pub struct DuplicateArgs {
    /// Folder to scan
    pub dir: PathBuf,
    /// Compare every file, not just photos
    #[arg(long)]
    pub all_files: bool,
    /// Only scan the top level of the folder
    #[arg(long)]
    pub no_recursive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_flags() {
        let cli = Cli::parse_from([
            "smartsort",
            "sort",
            "/tmp/in",
            "--move",
            "--category",
            "photos",
            "--category",
            "PDFs",
        ]);
        let Some(Commands::Sort(args)) = cli.command else {
            panic!("expected sort command");
        };
        assert!(args.move_files);
        assert!(!args.recursive);
        assert_eq!(args.categories, vec![Category::Photos, Category::Pdfs]);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let result = Cli::try_parse_from(["smartsort", "sort", "/tmp/in", "--category", "memes"]);
        assert!(result.is_err());
    }
}
