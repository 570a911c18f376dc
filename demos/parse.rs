use std::io::BufReader;

use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let suite = match std::env::args().nth(1) {
        Some(file) => {
            let file = std::fs::File::open(file).unwrap();
            tap_suite::parse_reader(BufReader::new(file))
        }
        None => tap_suite::parse_reader(std::io::stdin().lock()),
    };

    match suite {
        Ok(suite) => {
            println!("{suite}");
            println!(
                "# passed {}, failed {}, skipped {}, todo {} in {:?}",
                suite.passed(),
                suite.failed(),
                suite.skipped(),
                suite.todo(),
                suite.time
            );
            println!("# {}", if suite.ok { "PASS" } else { "FAIL" });
        }
        Err(e) => println!("Parse error: {e}"),
    }
}
