use std::process::Command;

fn main() {
    let unknown = String::from("************");

    let output = Command::new("git").args(&["rev-parse", "--short", "HEAD"]).output();

    let git_hash = match output {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout)
            .map(|hash| hash.trim().to_owned())
            .unwrap_or(unknown),
        _ => unknown,
    };

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
}
