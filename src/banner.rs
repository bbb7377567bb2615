// src/banner.rs

/// Prints the application startup banner to the console.
pub fn print_banner() {
    let banner = r#"
       _
  __ _| |_ __ _
 / _` | __/ _` |
| (_| | || (_| |
 \__,_|\__\__, |
          |___/

    Code Execution & Test Report Gateway
"#;
    eprintln!("{}", banner);
}
