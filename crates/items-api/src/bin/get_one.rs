use items_core::Operation;
use lambda_http::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    items_api::lambda::serve(Operation::GetOne).await
}
