extern crate ansi_term;
use crate::error;
use crate::lang::{convert, io_error, EncodedBlob, Error, Format};
use ansi_term::Style;
use std::fs::File;
use std::io::{Read, Write};

const USAGE: &str = "usage: basic --convert[=a|b|p] INFILE OUTFILE";

pub fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args).and_then(|(format, infile, outfile)| {
        convert_file(infile, outfile, format)
    }) {
        Ok(()) => {}
        Err(error) => {
            eprintln!("{}", Style::new().bold().paint(error.to_string()));
            std::process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Result<(Format, &str, &str), Error> {
    let (flag, infile, outfile) = match args {
        [flag, infile, outfile] => (flag.as_str(), infile.as_str(), outfile.as_str()),
        _ => return Err(error!(IllegalFunctionCall; USAGE)),
    };
    let format = match flag {
        "--convert" => Format::PlainText,
        _ => match flag.strip_prefix("--convert=") {
            Some(letter) if letter.chars().count() == 1 => letter
                .chars()
                .next()
                .and_then(Format::from_letter)
                .ok_or_else(|| error!(IllegalFunctionCall; USAGE))?,
            _ => return Err(error!(IllegalFunctionCall; USAGE)),
        },
    };
    Ok((format, infile, outfile))
}

/// Read a program file and write it back out in `format`.
pub fn convert_file(infile: &str, outfile: &str, format: Format) -> Result<(), Error> {
    let mut bytes = vec![];
    File::open(infile)
        .and_then(|mut file| file.read_to_end(&mut bytes))
        .map_err(|e| io_error(&e))?;
    let converted = convert(&EncodedBlob::from_bytes(bytes)?, format)?;
    File::create(outfile)
        .and_then(|mut file| file.write_all(converted.as_bytes()))
        .map_err(|e| io_error(&e))
}
