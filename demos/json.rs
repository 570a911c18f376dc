use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let input = std::env::args().nth(1).unwrap();
    let input = std::fs::read_to_string(input).unwrap();

    let suite = tap_suite::parse_str(&input).unwrap();

    println!("{}", serde_json::to_string_pretty(&suite).unwrap());
}
