/**
 * SubRec
 * Copyright (C) 2019 The SubRec contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::fs::File;
use std::io;
use std::io::prelude::*;
use std::io::stdout;
use std::path::Path;

use serde_derive::Deserialize;

use crate::error::Error;

/// A single row of the training log. The log is a headered CSV file with
/// `context,item,count` columns, e.g. one row per (person, community) pair
/// with the number of posts the person wrote there.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    pub context: String,
    pub item: String,
    pub count: u64,
}

/// Reads the complete training log into memory. An empty log is rejected
/// later by the matrix builder; here we only surface I/O and parse errors.
pub fn read_log(path: &str) -> Result<Vec<Interaction>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: Interaction = result?;
        records.push(record);
    }

    Ok(records)
}

/// Writes the training-time self-evaluation: one line per (item, neighbor)
/// pair with the cosine score, tab-separated. If a path is supplied we write
/// to a file, otherwise to stdout.
pub fn write_similarities(
    neighbors: &[(String, Vec<(String, f64)>)],
    similarities_path: Option<String>,
) -> io::Result<()> {
    let mut out: Box<dyn Write> = match similarities_path {
        Some(path) => Box::new(File::create(&Path::new(&path))?),
        _ => Box::new(stdout()),
    };

    for (item, related) in neighbors.iter() {
        for (other_item, score) in related.iter() {
            writeln!(out, "{}\t{}\t{}", item, other_item, score)?;
        }
    }

    Ok(())
}
