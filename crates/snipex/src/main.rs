fn main() {
    snipex_cli::run_main();
}
