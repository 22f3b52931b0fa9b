use std::env;
use std::fs;
use std::io::prelude::*;
use std::path::Path;
use std::process;

use fnv::FnvHashMap;
use getopts::Options;
use tracing_subscriber::EnvFilter;

use subrec::recommend::{Recommender, DEFAULT_NUM_RECOMMENDATIONS};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("m", "modeldir", "Directory with the model artifacts (required).", "PATH");
    opts.optopt("c", "counts", "JSON file with a community → post count mapping (optional, \
        read from stdin by default).", "PATH");
    opts.optopt("n", "num-recommendations", "Number of communities to recommend (optional, \
        defaults to 15).", "NUMBER");
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

    if !matches.opt_present("m") {
        return print_usage_and_exit(
            &program,
            opts,
            Some("Please specify a model directory via --modeldir."),
        );
    }

    let model_dir = matches.opt_str("m").unwrap();
    let counts_path = matches.opt_str("c");

    let n: usize = match matches.opt_get_default("n", DEFAULT_NUM_RECOMMENDATIONS) {
        Ok(n) => n,
        Err(failure) => {
            let hint = format!("Problem with option 'n': {}", failure);
            return print_usage_and_exit(&program, opts, Some(&hint));
        }
    };

    // A broken or inconsistent artifact set means we must not serve requests.
    let recommender = match Recommender::from_dir(Path::new(&model_dir)) {
        Ok(recommender) => recommender,
        Err(failure) => {
            eprintln!("Cannot load model: {}", failure);
            process::exit(1);
        }
    };

    let raw_counts = match counts_path {
        Some(path) => fs::read_to_string(&path),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map(|_| buffer)
        }
    };

    let raw_counts = match raw_counts {
        Ok(raw_counts) => raw_counts,
        Err(failure) => {
            eprintln!("Cannot read post counts: {}", failure);
            process::exit(1);
        }
    };

    let post_counts: FnvHashMap<String, u64> = match serde_json::from_str(&raw_counts) {
        Ok(post_counts) => post_counts,
        Err(failure) => {
            eprintln!("Cannot parse post counts: {}", failure);
            process::exit(1);
        }
    };

    match recommender.get_similar(&post_counts, n) {
        Ok(recommendations) => {
            for community in recommendations.iter() {
                println!("{}", community);
            }
        }
        Err(failure) => {
            eprintln!("Recommendation failed: {}", failure);
            process::exit(1);
        }
    }
}

fn print_usage_and_exit(program: &str, opts: Options, hint: Option<&str>) {
    if let Some(hint) = hint {
        eprintln!("\n{}\n", hint);
    }

    let brief = format!("Usage: {} [options]", program);
    eprint!("{}", opts.usage(&brief));
}
