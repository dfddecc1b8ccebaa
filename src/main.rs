fn main() -> anyhow::Result<()> {
    agirouter::cli::run_cli()
}
