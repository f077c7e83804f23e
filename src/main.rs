use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    markstream::cli::main()
}
