// tests/run_partition.rs
//
// Full run against a local HTTP server: urls file in, match CSV out.
//
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use matchscrap::config::Throttle;
use matchscrap::{run_partition, CrawlConfig, OnMissing, Partition};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const REPORT: &str = r#"<html><body>
<div class="tm-subnav"><ul>
  <li id="statistik"><a class="tm-subnav-item megamenu" href="/spielbericht/statistik/spielbericht/42">Statistics</a></li>
</ul></div>
<div class="box sb-spielbericht-head"><div class="box-content">
  <div class="sb-team sb-heim"><a class="sb-vereinslink" href="/fc-schalke-04/spielplan/verein/33/saison_id/2019">FC Schalke 04</a></div>
  <div class="sb-spieldaten">
    <p class="sb-datum hide-for-small"><a href="/bundesliga/spieltag/wettbewerb/L1/saison_id/2019/spieltag/3">3. Matchday</a> | <a href="/aktuell/waspassiertheute/aktuell/new/datum/2019-08-31">Sat, 31.08.19</a></p>
    <div class="ergebnis-wrap"><div class="sb-ergebnis"><div class="sb-endstand">3:1<div class="sb-halbzeit">(1:0)</div></div></div></div>
  </div>
  <div class="sb-team sb-gast"><a class="sb-vereinslink" href="/hertha-bsc/spielplan/verein/44/saison_id/2019">Hertha BSC</a></div>
</div></div>
</body></html>"#;

const STATISTICS: &str = r#"<html><body><div class="box"><div class="sb-statistik"><ul>
<li class="sb-statistik-heim"><div><div class="sb-statistik-zahl">15</div></div></li><li class="sb-statistik-gast"><div><div class="sb-statistik-zahl">9</div></div></li>
<li class="sb-statistik-heim"><div><div class="sb-statistik-zahl">6</div></div></li><li class="sb-statistik-gast"><div><div class="sb-statistik-zahl">4</div></div></li>
<li class="sb-statistik-heim"><div><div class="sb-statistik-zahl">2</div></div></li><li class="sb-statistik-gast"><div><div class="sb-statistik-zahl">3</div></div></li>
<li class="sb-statistik-heim"><div><div class="sb-statistik-zahl">7</div></div></li><li class="sb-statistik-gast"><div><div class="sb-statistik-zahl">5</div></div></li>
<li class="sb-statistik-heim"><div><div class="sb-statistik-zahl">12</div></div></li><li class="sb-statistik-gast"><div><div class="sb-statistik-zahl">16</div></div></li>
<li class="sb-statistik-heim"><div><div class="sb-statistik-zahl">14</div></div></li><li class="sb-statistik-gast"><div><div class="sb-statistik-zahl">11</div></div></li>
<li class="sb-statistik-heim"><div><div class="sb-statistik-zahl">2</div></div></li><li class="sb-statistik-gast"><div><div class="sb-statistik-zahl">0</div></div></li>
</ul></div></div></body></html>"#;

/// Serves the report and statistics pages, 404 for anything else. Counts requests.
async fn serve_site() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let head = String::from_utf8_lossy(&buf[..n]).into_owned();
            let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

            let (status, body) = match path.as_str() {
                "/spielbericht/index/spielbericht/42" => ("200 OK", REPORT),
                "/spielbericht/statistik/spielbericht/42" => ("200 OK", STATISTICS),
                _ => ("404 Not Found", ""),
            };
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (base, hits)
}

#[tokio::test]
async fn writes_header_and_row_then_resumes_to_nothing() {
    let (base, hits) = serve_site().await;
    let dir = tempfile::tempdir().unwrap();
    let urls_file = dir.path().join("match_urls.csv");
    fs::write(
        &urls_file,
        format!(
            "url\n{base}/spielbericht/index/spielbericht/42\n{base}/spielbericht/index/spielbericht/404\n"
        ),
    )
    .unwrap();

    let config = CrawlConfig {
        base_url: base.clone(),
        urls_file,
        data_dir: dir.path().join("data"),
        output_name: "bundesliga".into(),
        partition: Partition::default(),
        user_agent: Some("matchscrap-test".into()),
        throttle: Throttle {
            every: 0,
            ..Default::default()
        },
        on_missing: OnMissing::SkipAndLog,
        ..Default::default()
    };
    let output = dir.path().join("data").join("matches").join("bundesliga.csv");
    assert_eq!(config.output_path(), output);

    let summary = run_partition(&config).await.unwrap();
    assert_eq!((summary.written, summary.skipped), (1, 1));

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("url_id,match_id,home_team_id,home_team,away_team_id,away_team,"));
    assert!(lines[0].ends_with(",home_offsides,away_offsides"));
    assert!(lines[1].starts_with("0,42,33,FC Schalke 04,44,Hertha BSC,3:1,3,31.08.19,"));
    assert!(lines[1].ends_with(",15,9,6,4,2,3,7,5,12,16,14,11,2,0"));

    // The failed url is still pending, so only it is tried again.
    let before = hits.load(Ordering::SeqCst);
    let summary = run_partition(&config).await.unwrap();
    assert_eq!((summary.attempted, summary.written), (1, 0));
    assert_eq!(hits.load(Ordering::SeqCst), before + 1);
    assert_eq!(fs::read_to_string(&output).unwrap(), content);
}
