//! Utilities for working with CSV files.

use std::fs::File;
use std::io;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;

use anyhow::{anyhow, Context};

use crate::benchmark::BenchmarkPoint;

pub struct CsvWriter<W: Write> {
    writer: W,
}
impl CsvWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}
impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn append<R>(&mut self, record: R) -> Result<(), io::Error>
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let mut first = true;
        for datum in record.into_iter() {
            if first {
                first = false;
            } else {
                self.writer.write_all(b",")?;
            }
            self.writer.write_all(datum.as_ref().as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), io::Error> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub struct CsvReader<R: BufRead> {
    lines: Lines<R>,
}
impl CsvReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, io::Error> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}
impl<R: BufRead> CsvReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    pub fn read(&mut self) -> Option<Result<Vec<String>, io::Error>> {
        self.lines.next().map(|line| {
            line.map(|line| line.split(',').map(|datum| datum.trim().to_string()).collect())
        })
    }
}

impl<R: BufRead> Iterator for CsvReader<R> {
    type Item = Result<Vec<String>, io::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read()
    }
}

/// Reads `input,price` records following a header row. Blank lines are skipped.
pub fn read_benchmarks<R: BufRead>(csv: CsvReader<R>) -> Result<Vec<BenchmarkPoint>, anyhow::Error> {
    let mut points: Vec<BenchmarkPoint> = vec![];
    for (line_index, record) in csv.enumerate().skip(1) {
        let record = record?;
        if record.iter().all(String::is_empty) {
            continue;
        }
        let line = line_index + 1;
        let [input, price] = record.as_slice() else {
            return Err(anyhow!("expected 2 columns on line {line}, got {}", record.len()));
        };
        let input = input
            .parse::<f64>()
            .with_context(|| format!("invalid input '{input}' on line {line}"))?;
        let price = price
            .parse::<f64>()
            .with_context(|| format!("invalid price '{price}' on line {line}"))?;
        points.push((input, price).into());
    }
    Ok(points)
}
