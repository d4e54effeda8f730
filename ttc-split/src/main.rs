//! binary collection splitter
//!
//! Takes a TrueType collection (.ttc) and writes each font it contains to a
//! standalone font file named after the font's family.
//!

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use ttc_split::{
    inspect, name::NameQuery, open_input, SplitError, SplitMode, SplitOptions, SplitReport,
    TablePadding, TtcSplitter,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The input collection file.
    #[arg(short, long)]
    input: PathBuf,

    /// The directory output fonts are written to. It must already exist.
    #[arg(short, long, required_unless_present = "list")]
    output_dir: Option<PathBuf>,

    /// Platform id of the name record used for output file names
    #[arg(long, default_value = "3", value_parser = parse_u16)]
    platform_id: u16,

    /// Language id of the name record used for output file names, e.g. 0x0409
    #[arg(long, default_value = "0x0411", value_parser = parse_u16)]
    language_id: u16,

    /// Copy every table, including ones that are not registered OpenType tables
    #[arg(long)]
    full: bool,

    /// Pad every table to a four byte boundary
    #[arg(long)]
    align_tables: bool,

    /// Print the fonts in the collection instead of splitting it
    #[arg(short, long)]
    list: bool,
}

fn parse_u16(arg: &str) -> Result<u16, String> {
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => arg.parse(),
    };
    parsed.map_err(|e| format!("invalid id '{arg}': {e}"))
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let report = if args.list {
        list_fonts(&args).map_or_else(|e| SplitReport::from(&e), |_| success())
    } else {
        split(&args)
    };

    if report.success {
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", report.message);
        ExitCode::from(report.kind.code() as u8)
    }
}

fn split(args: &Args) -> SplitReport {
    let mut options = SplitOptions::new(args.platform_id, args.language_id);
    if args.align_tables {
        options = options.with_padding(TablePadding::Aligned);
    }
    let mode = if args.full {
        SplitMode::Full
    } else {
        SplitMode::Filtered
    };
    // clap guarantees an output dir when not listing
    let output_dir = args.output_dir.clone().unwrap_or_default();
    let splitter = TtcSplitter::new(&args.input, output_dir, options);
    let result = splitter.split(mode);
    if let Ok(summary) = &result {
        for path in &summary.written {
            println!("{}", path.display());
        }
    }
    result.into()
}

fn list_fonts(args: &Args) -> Result<(), SplitError> {
    let query = NameQuery::family_name(args.platform_id, args.language_id);
    let (header, fonts) = inspect(open_input(&args.input)?, &query)?;

    println!(
        "ttcf {}.{}, {} fonts",
        header.version.major,
        header.version.minor,
        header.num_fonts()
    );
    for font in fonts {
        println!();
        println!(
            "#{} at 0x{:08X}: {} tables, family name {}",
            font.index,
            font.offset,
            font.directory.table_records.len(),
            font.family_name
                .as_deref()
                .map(|name| format!("'{name}'"))
                .unwrap_or_else(|| "<none>".to_string())
        );
        if !font.lang_tags.is_empty() {
            println!("language tags: {}", font.lang_tags.join(", "));
        }
        println!("Tag  Offset      Length  Checksum");
        println!("-----------------------------------");
        for record in &font.directory.table_records {
            println!(
                "{} 0x{:08X} {:8} 0x{:08X}",
                record.tag, record.offset, record.length, record.checksum
            );
        }
    }
    Ok(())
}

fn success() -> SplitReport {
    SplitReport {
        success: true,
        kind: Default::default(),
        message: String::new(),
        version: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids() {
        assert_eq!(parse_u16("3"), Ok(3));
        assert_eq!(parse_u16("0x0411"), Ok(0x0411));
        assert_eq!(parse_u16("0X409"), Ok(0x0409));
        assert!(parse_u16("0x10000").is_err());
        assert!(parse_u16("three").is_err());
    }

    #[test]
    fn args_are_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn output_dir_required_unless_listing() {
        assert!(Args::try_parse_from(["ttc-split", "-i", "a.ttc"]).is_err());
        let args = Args::try_parse_from(["ttc-split", "-i", "a.ttc", "--list"]).unwrap();
        assert!(args.list);
        let args =
            Args::try_parse_from(["ttc-split", "-i", "a.ttc", "-o", "out", "--language-id", "0x409"])
                .unwrap();
        assert_eq!(args.language_id, 0x0409);
        assert_eq!(args.platform_id, 3);
        assert!(!args.full);
    }
}
