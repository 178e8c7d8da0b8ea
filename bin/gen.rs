use std::io::{self, Write};

use anyhow::Context;
use clap::{Arg, ArgAction, Command};

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .about("Write a product CSV to stdout")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("with_header")
                .long("with-header")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("bad_row_at")
                .long("bad-row-at")
                .help("Drop the last field of this data row to produce a malformed file")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let rows = matches
        .get_one::<u64>("rows")
        .copied()
        .context("--rows is required")?;
    let with_header = matches.get_flag("with_header");
    let bad_row_at = matches.get_one::<u64>("bad_row_at").copied();

    let mut out = io::BufWriter::new(io::stdout().lock());

    if with_header {
        writeln!(&mut out, "title,description,price,count")?;
    }

    for i in 0..rows {
        let (batch, dollars, cents) = (i / 100, 10 + i % 90, i % 100);
        write!(
            &mut out,
            "Product {i},\"Item {i}, batch {batch}\",{dollars}.{cents:02}"
        )?;
        if bad_row_at != Some(i) {
            write!(&mut out, ",{}", i % 25)?;
        }
        writeln!(&mut out)?;
        if i % 10_000 == 0 {
            out.flush()?;
        }
    }

    out.flush()?;
    Ok(())
}
