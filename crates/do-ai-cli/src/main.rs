// SPDX-License-Identifier: MIT

#[tokio::main]
async fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let code = do_ai::run::run(argv).await;
    std::process::exit(code);
}
