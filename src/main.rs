fn main() -> anyhow::Result<()> {
    truss_scan_lib::run()
}
