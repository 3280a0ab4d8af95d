fn main() -> anyhow::Result<()> {
    allodsbin::cli::run_cli()
}
