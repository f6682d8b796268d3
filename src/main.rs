use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    nexus::cli::main()
}
