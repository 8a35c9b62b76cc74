use std::fs::File;
use std::io::{self, BufReader};
use std::process;

use getopts::Options;

use rdbstream::{filter, Stats};

fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [options] dump.rdb", program);
    print!("{}", opts.usage(&brief));
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("n", "top", "Number of keys in the size ranking (default 10)", "N");
    opts.optflag("h", "help", "print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}\n", e);
            print_usage(&program, &opts);
            process::exit(1);
        }
    };

    if matches.opt_present("h") {
        print_usage(&program, &opts);
        return;
    }

    let top = match matches.opt_str("n").map(|n| n.parse::<usize>()) {
        None => 10,
        Some(Ok(n)) => n,
        Some(Err(_)) => {
            eprintln!("Invalid value for --top\n");
            print_usage(&program, &opts);
            process::exit(1);
        }
    };

    let path = match matches.free.first() {
        Some(p) => p.clone(),
        None => {
            print_usage(&program, &opts);
            process::exit(1);
        }
    };

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Cannot open {}: {}", path, e);
            process::exit(1);
        }
    };

    let parser = match rdbstream::parse(BufReader::new(file), filter::Simple::new()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Parsing failed: {}", e);
            process::exit(1);
        }
    };

    let mut stats = Stats::new();
    for event in parser {
        match event {
            Ok(event) => stats.observe(&event),
            Err(e) => {
                eprintln!("Parsing failed: {}", e);
                process::exit(1);
            }
        }
    }

    if let Err(e) = stats.report(&mut io::stdout(), top) {
        eprintln!("Cannot write report: {}", e);
        process::exit(1);
    }
}
