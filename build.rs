use std::process::Command;

fn main() {
    let version = get_version();
    println!("cargo:rustc-env=TCPBRIDGE_VERSION={}", version);
}

fn get_version() -> String {
    for args in [
        &["describe", "--tags", "--always", "--dirty"][..],
        &["rev-parse", "--short", "HEAD"][..],
    ] {
        if let Ok(output) = Command::new("git").args(args).output() {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !version.is_empty() {
                    return version;
                }
            }
        }
    }

    env!("CARGO_PKG_VERSION").to_string()
}
