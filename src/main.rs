//! Command-line front end for N-up imposition.
//!
//! The option surface follows the traditional getopt one: short options
//! with attached values (`-pa4`, `-m20`), cumulative layout toggles, and a
//! bare `-N` digit for the page count per sheet.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process;

use clap::{Arg, ArgAction, ArgMatches, Command};

use psnup::common::unit::{self, DimenContext};
use psnup::{Error, Options, Result, paper};

fn cli() -> Command {
    let mut cmd = Command::new("psnup")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Put multiple pages of a PostScript document on to one page")
        .override_usage(
            "psnup [-q] [-wWIDTH -hHEIGHT|-pPAPER] [-WWIDTH -HHEIGHT|-PPAPER]\n       \
             [-l] [-r] [-c] [-f] [-mMARGIN] [-bBORDER] [-dLWIDTH] [-sSCALE]\n       \
             [-tTOL] [-NUP] [INFILE [OUTFILE]]",
        )
        // -h is the output height, so the help flag is long-only
        .disable_help_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .action(ArgAction::Help)
                .help("Print help"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .action(ArgAction::SetTrue)
                .help("Suppress progress reporting"),
        )
        .arg(
            Arg::new("draw")
                .short('d')
                .value_name("LWIDTH")
                .num_args(0..=1)
                .default_missing_value("1")
                .help("Draw a border around each page [default width 1pt]"),
        )
        .arg(
            Arg::new("landscape")
                .short('l')
                .action(ArgAction::Count)
                .help("Landscape input (rotated left)"),
        )
        .arg(
            Arg::new("seascape")
                .short('r')
                .action(ArgAction::Count)
                .help("Seascape input (rotated right)"),
        )
        .arg(
            Arg::new("flip")
                .short('f')
                .action(ArgAction::SetTrue)
                .help("Swap output width and height"),
        )
        .arg(
            Arg::new("column")
                .short('c')
                .action(ArgAction::Count)
                .help("Fill columns before rows"),
        )
        .arg(
            Arg::new("width")
                .short('w')
                .value_name("WIDTH")
                .help("Output page width"),
        )
        .arg(
            Arg::new("height")
                .short('h')
                .value_name("HEIGHT")
                .help("Output page height"),
        )
        .arg(
            Arg::new("iwidth")
                .short('W')
                .value_name("WIDTH")
                .help("Input page width"),
        )
        .arg(
            Arg::new("iheight")
                .short('H')
                .value_name("HEIGHT")
                .help("Input page height"),
        )
        .arg(
            Arg::new("paper")
                .short('p')
                .value_name("PAPER")
                .help("Output paper name (and default input size)"),
        )
        .arg(
            Arg::new("ipaper")
                .short('P')
                .value_name("PAPER")
                .help("Input paper name"),
        )
        .arg(
            Arg::new("margin")
                .short('m')
                .value_name("MARGIN")
                .help("Margin around the whole sheet"),
        )
        .arg(
            Arg::new("border")
                .short('b')
                .value_name("BORDER")
                .help("Border around each page"),
        )
        .arg(
            Arg::new("tolerance")
                .short('t')
                .value_name("TOL")
                .help("Layout waste tolerance [default 100000]"),
        )
        .arg(
            Arg::new("scale")
                .short('s')
                .value_name("SCALE")
                .help("Override the computed page scale"),
        )
        .arg(
            Arg::new("nup")
                .short('n')
                .value_name("N")
                .help("Pages per sheet"),
        )
        .arg(Arg::new("infile").value_name("INFILE").help("Input file [stdin]"))
        .arg(Arg::new("outfile").value_name("OUTFILE").help("Output file [stdout]"));
    for digit in '1'..='9' {
        cmd = cmd.arg(
            Arg::new(format!("nup{digit}"))
                .short(digit)
                .action(ArgAction::SetTrue)
                .hide(true),
        );
    }
    cmd
}

/// The last `-n N` or `-N` digit on the command line wins, as it would in a
/// getopt loop.
fn last_nup(matches: &ArgMatches) -> Result<Option<u32>> {
    let mut best: Option<(usize, u32)> = None;
    if let Some(value) = matches.get_one::<String>("nup") {
        if let Some(at) = matches.indices_of("nup").and_then(|ix| ix.last()) {
            best = Some((at, unit::parse_int(value)?));
        }
    }
    for digit in 1..=9u32 {
        let id = format!("nup{digit}");
        if matches.get_flag(&id) {
            if let Some(at) = matches.indices_of(&id).and_then(|ix| ix.last()) {
                if best.map_or(true, |(b, _)| at > b) {
                    best = Some((at, digit));
                }
            }
        }
    }
    Ok(best.map(|(_, n)| n))
}

fn build_options(matches: &ArgMatches) -> Result<Options> {
    let mut opts = Options::default();

    if matches.get_count("landscape") % 2 == 1 {
        opts.column = !opts.column;
        opts.topbottom = !opts.topbottom;
    }
    if matches.get_count("seascape") % 2 == 1 {
        opts.column = !opts.column;
        opts.leftright = !opts.leftright;
    }
    if matches.get_count("column") % 2 == 1 {
        opts.column = !opts.column;
    }
    opts.flip = matches.get_flag("flip");

    // paper names resolve first so that w/h dimension suffixes can refer
    // to the output sheet
    if let Some(name) = matches.get_one::<String>("paper") {
        let size = paper::paper_size(name).ok_or_else(|| Error::UnknownPaper(name.clone()))?;
        opts.width = Some(size.width);
        opts.height = Some(size.height);
    }
    if let Some(name) = matches.get_one::<String>("ipaper") {
        let size = paper::paper_size(name).ok_or_else(|| Error::UnknownPaper(name.clone()))?;
        opts.iwidth = Some(size.width);
        opts.iheight = Some(size.height);
    }

    let mut ctx = DimenContext {
        width: opts.width,
        height: opts.height,
    };
    if let Some(arg) = matches.get_one::<String>("width") {
        opts.width = Some(unit::single_dimen(arg, &ctx)?);
        ctx.width = opts.width;
    }
    if let Some(arg) = matches.get_one::<String>("height") {
        opts.height = Some(unit::single_dimen(arg, &ctx)?);
        ctx.height = opts.height;
    }
    if let Some(arg) = matches.get_one::<String>("iwidth") {
        opts.iwidth = Some(unit::single_dimen(arg, &ctx)?);
    }
    if let Some(arg) = matches.get_one::<String>("iheight") {
        opts.iheight = Some(unit::single_dimen(arg, &ctx)?);
    }
    if let Some(arg) = matches.get_one::<String>("margin") {
        opts.margin = unit::single_dimen(arg, &ctx)?;
    }
    if let Some(arg) = matches.get_one::<String>("border") {
        opts.border = unit::single_dimen(arg, &ctx)?;
    }
    if let Some(arg) = matches.get_one::<String>("draw") {
        opts.draw = unit::single_dimen(arg, &ctx)?;
    }
    if let Some(arg) = matches.get_one::<String>("tolerance") {
        opts.tolerance = unit::single_double(arg)?;
    }
    if let Some(arg) = matches.get_one::<String>("scale") {
        opts.scale = Some(unit::single_double(arg)?);
    }
    if let Some(nup) = last_nup(matches)? {
        if nup == 0 {
            return Err(Error::BadNup);
        }
        opts.nup = nup;
    }

    // the system paper is the default only when nothing else set a size
    if opts.width.is_none()
        && opts.height.is_none()
        && opts.iwidth.is_none()
        && opts.iheight.is_none()
    {
        if let Some(size) = paper::system_paper_size() {
            opts.width = Some(size.width);
            opts.height = Some(size.height);
        }
    }

    Ok(opts)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let opts = build_options(matches)?;
    let input = match matches.get_one::<String>("infile") {
        Some(path) => File::open(path)?,
        None => psnup::io::spool_to_temp(io::stdin().lock())?,
    };
    let output: Box<dyn Write> = match matches.get_one::<String>("outfile") {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    psnup::run(&opts, input, BufWriter::new(output))?;
    Ok(())
}

fn main() {
    let matches = cli().get_matches();
    let _ = stderrlog::new()
        .module("psnup")
        .verbosity(2)
        .quiet(matches.get_flag("quiet"))
        .init();
    if let Err(err) = run(&matches) {
        eprintln!("psnup: {err}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(args: &[&str]) -> Result<Options> {
        let matches = cli()
            .try_get_matches_from(std::iter::once("psnup").chain(args.iter().copied()))
            .unwrap();
        build_options(&matches)
    }

    #[test]
    fn attached_values_parse() {
        let opts = options(&["-2", "-pa4", "-m20", "-b5", "-d1"]).unwrap();
        assert_eq!(opts.nup, 2);
        assert_eq!(opts.width, Some(595.0));
        assert_eq!(opts.height, Some(842.0));
        assert_eq!(opts.margin, 20.0);
        assert_eq!(opts.border, 5.0);
        assert_eq!(opts.draw, 1.0);
    }

    #[test]
    fn draw_defaults_to_one_point() {
        assert_eq!(options(&["-d", "-2", "-pa4"]).unwrap().draw, 1.0);
        assert_eq!(options(&["-d0.5", "-pa4"]).unwrap().draw, 0.5);
        assert_eq!(options(&["-pa4"]).unwrap().draw, 0.0);
    }

    #[test]
    fn landscape_toggles_column_and_topbottom() {
        let opts = options(&["-l", "-pa4"]).unwrap();
        assert!(opts.column);
        assert!(!opts.topbottom);
        assert!(opts.leftright);

        // two toggles cancel out
        let opts = options(&["-l", "-l", "-pa4"]).unwrap();
        assert!(!opts.column);
        assert!(opts.topbottom);

        let opts = options(&["-r", "-c", "-pa4"]).unwrap();
        assert!(!opts.column);
        assert!(!opts.leftright);
    }

    #[test]
    fn last_nup_option_wins() {
        assert_eq!(options(&["-2", "-n", "6", "-pa4"]).unwrap().nup, 6);
        assert_eq!(options(&["-n16", "-pa4"]).unwrap().nup, 16);
        assert_eq!(options(&["-n", "3", "-4", "-pa4"]).unwrap().nup, 4);
    }

    #[test]
    fn zero_nup_is_rejected() {
        assert!(matches!(options(&["-n0", "-pa4"]), Err(Error::BadNup)));
    }

    #[test]
    fn unknown_paper_is_rejected() {
        assert!(matches!(
            options(&["-pletterbox"]),
            Err(Error::UnknownPaper(_))
        ));
    }

    #[test]
    fn sheet_relative_margins() {
        let opts = options(&["-pa4", "-m0.1w"]).unwrap();
        assert!((opts.margin - 59.5).abs() < 1e-9);
    }

    #[test]
    fn input_paper_sets_input_dims() {
        let opts = options(&["-pa4", "-Pletter"]).unwrap();
        assert_eq!(opts.iwidth, Some(612.0));
        assert_eq!(opts.iheight, Some(792.0));
        assert_eq!(opts.width, Some(595.0));
    }
}
