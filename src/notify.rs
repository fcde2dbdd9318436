use crate::error::Result;

#[derive(Debug, Clone)]
pub struct NotifySettings {
    pub title: String,
    pub app_name: String,
    pub timeout_secs: u32,
}

pub fn send(settings: &NotifySettings, body: &str) -> Result<()> {
    let mut notification = notify_rust::Notification::new();
    notification
        .summary(&settings.title)
        .body(body)
        .appname(&settings.app_name)
        .timeout(notify_rust::Timeout::Milliseconds(
            settings.timeout_secs.saturating_mul(1000),
        ));

    notification.show()?;
    Ok(())
}
