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

use std::env;
use std::path::Path;
use std::process;

use getopts::Options;
use tracing_subscriber::EnvFilter;

use subrec::io;
use subrec::recommend::Recommender;
use subrec::{Error, TrainConfig};

const NUM_RELATED_FOR_EVALUATION: usize = 10;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("i", "inputfile", "Input file name (required). The training log must be a \
        CSV file with a header and context,item,count columns, e.g. one row per person and \
        community with the number of posts.", "PATH");
    opts.optopt("m", "modeldir", "Directory to write the model artifacts to (required).",
        "PATH");
    opts.optopt("o", "similarities", "File to write the training-time self-evaluation to \
        (optional): the top related communities per community with cosine scores.", "PATH");
    opts.optopt("f", "factors", "Rank of the factorization (optional, defaults to 50).",
        "NUMBER");
    opts.optopt("r", "regularization", "Regularization constant of the least-squares solves \
        (optional, defaults to 0.01, must be positive).", "NUMBER");
    opts.optopt("s", "sweeps", "Number of alternating sweeps (optional, defaults to 15).",
        "NUMBER");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    if !matches.opt_present("i") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify an inputfile via --inputfile."),
        );
    }

    if !matches.opt_present("m") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a model directory via --modeldir."),
        );
    }

    let input_path = matches.opt_str("i").unwrap();
    let model_dir = matches.opt_str("m").unwrap();
    let similarities_path = matches.opt_str("o");

    let defaults = TrainConfig::default();

    let rank: usize = match matches.opt_get_default("f", defaults.rank) {
        Ok(rank) => rank,
        Err(failure) => {
            let hint = format!("Problem with option 'f': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let regularization: f64 = match matches.opt_get_default("r", defaults.regularization) {
        Ok(regularization) => regularization,
        Err(failure) => {
            let hint = format!("Problem with option 'r': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let sweeps: usize = match matches.opt_get_default("s", defaults.sweeps) {
        Ok(sweeps) => sweeps,
        Err(failure) => {
            let hint = format!("Problem with option 's': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    let config = TrainConfig {
        rank,
        regularization,
        sweeps,
        ..defaults
    };

    if let Err(failure) = train_model(&input_path, &model_dir, similarities_path, &config) {
        eprintln!("Training failed: {}", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(program: &str, opts: Options, hint: Option<&str>) {
    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}

fn train_model(
    input_path: &str,
    model_dir: &str,
    similarities_path: Option<String>,
    config: &TrainConfig,
) -> Result<(), Error> {
    println!("Reading interaction log from {}", input_path);
    let records = io::read_log(input_path)?;

    let artifacts = subrec::train(&records, config)?;

    artifacts.save(Path::new(model_dir))?;
    println!("Model artifacts written to {}", model_dir);

    if similarities_path.is_some() {
        println!("Evaluating the model on its own communities...");

        let recommender = Recommender::from_artifacts(artifacts)?;

        let neighbors: Vec<(String, Vec<(String, f64)>)> = (0..recommender.num_items() as u32)
            .map(|item| {
                let related = recommender
                    .top_related(item, NUM_RELATED_FOR_EVALUATION)
                    .into_iter()
                    .map(|(other, score)| (recommender.item_name(other).to_string(), score))
                    .collect();

                (recommender.item_name(item).to_string(), related)
            })
            .collect();

        io::write_similarities(&neighbors, similarities_path)?;
    }

    Ok(())
}
