fn main() {
    if let Err(e) = clinic_reports_lib::run() {
        eprintln!("clinic-reports: {e}");
        std::process::exit(1);
    }
}
