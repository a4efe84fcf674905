use crate::models::DashboardResponse;

pub fn render_dashboard(dashboard: &DashboardResponse) -> String {
    let peak = dashboard
        .last_7_days
        .iter()
        .map(|point| point.present_count)
        .max()
        .unwrap_or(0)
        .max(1);

    let bars: String = dashboard
        .last_7_days
        .iter()
        .map(|point| {
            let height = point.present_count * 100 / peak;
            format!(
                r#"<div class="bar"><span class="fill" style="height: {height}%"></span><span class="count">{}</span><span class="day">{}</span></div>"#,
                point.present_count,
                point.date.format("%m-%d"),
            )
        })
        .collect();

    INDEX_HTML
        .replace("{{TODAY}}", &dashboard.today.to_string())
        .replace("{{ACTIVE}}", &dashboard.active_members.to_string())
        .replace("{{PRESENT}}", &dashboard.present_today.to_string())
        .replace("{{PENDING}}", &dashboard.pending_members.to_string())
        .replace("{{BARS}}", &bars)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Gym Attendance</title>
  <style>
    :root {
      --primary: #4f46e5;
      --secondary: #10b981;
      --accent: #f59e0b;
      --bg: #f9fafb;
      --ink: #111827;
      --muted: #6b7280;
      --border: #e5e7eb;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: system-ui, sans-serif;
    }

    main {
      max-width: 960px;
      margin: 0 auto;
      padding: 32px 20px;
      display: grid;
      gap: 24px;
    }

    header h1 {
      margin: 0;
      font-size: 1.6rem;
    }

    header p {
      margin: 4px 0 0;
      color: var(--muted);
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 16px;
    }

    .card {
      background: white;
      border: 1px solid var(--border);
      border-radius: 8px;
      padding: 16px;
    }

    .card .label {
      color: var(--muted);
      font-size: 0.85rem;
    }

    .card .value {
      font-size: 1.8rem;
      font-weight: 700;
    }

    .present { color: var(--secondary); }
    .pending { color: var(--accent); }

    .chart {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 12px;
      align-items: end;
      height: 200px;
    }

    .bar {
      display: flex;
      flex-direction: column-reverse;
      align-items: center;
      height: 100%;
      gap: 4px;
    }

    .bar .fill {
      width: 100%;
      min-height: 2px;
      background: var(--primary);
      border-radius: 4px 4px 0 0;
    }

    .bar .count, .bar .day {
      font-size: 0.8rem;
      color: var(--muted);
    }
  </style>
</head>
<body>
  <main>
    <header>
      <h1>Gym Attendance</h1>
      <p>Today: {{TODAY}}</p>
    </header>

    <section class="cards">
      <div class="card">
        <div class="label">Active Members</div>
        <div class="value">{{ACTIVE}}</div>
      </div>
      <div class="card">
        <div class="label">Present Today</div>
        <div class="value present">{{PRESENT}}</div>
      </div>
      <div class="card">
        <div class="label">Pending</div>
        <div class="value pending">{{PENDING}}</div>
      </div>
    </section>

    <section class="card">
      <div class="label">Present, last 7 days</div>
      <div class="chart">{{BARS}}</div>
    </section>
  </main>
</body>
</html>
"#;
