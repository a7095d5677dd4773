fn main() {
    cv_last_round::cli::run();
}
