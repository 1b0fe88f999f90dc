use email_capture::startup::Application;
use email_capture::{get_configuration, get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("email-capture".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().expect("Failed to read configuration.");
    Application::build(configuration)
        .await?
        .run_until_stopped()
        .await?;
    Ok(())
}
