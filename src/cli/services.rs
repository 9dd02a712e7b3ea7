use anyhow::Result;
use stackbox::domain::SERVICE_PORTS;

pub fn run() -> Result<()> {
    print!("{}", render_table());
    Ok(())
}

fn render_table() -> String {
    let width = SERVICE_PORTS
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);

    let mut out = format!("{:<width$}  PORT\n", "SERVICE");
    for (name, port) in SERVICE_PORTS {
        out.push_str(&format!("{name:<width$}  {port}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_service() {
        let table = render_table();
        assert_eq!(table.lines().count(), SERVICE_PORTS.len() + 1);
        assert!(table.lines().any(|l| l.starts_with("s3 ") && l.ends_with("4572")));
        assert!(table.lines().any(|l| l.starts_with("streams.dynamodb") && l.ends_with("4570")));
    }
}
