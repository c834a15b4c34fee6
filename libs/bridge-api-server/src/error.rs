#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    #[error("bind :{port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    #[error("serve: {0}")]
    Serve(std::io::Error),
}
