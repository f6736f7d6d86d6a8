fn main() {
    survey_pipeline::cli::run();
}
