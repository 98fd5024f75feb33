fn main() -> anyhow::Result<()> {
    katalog_frontend::run_frontend()
}
