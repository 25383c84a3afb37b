use anyhow::Result;

fn main() -> Result<()> {
    riftgate::cli::run()
}
