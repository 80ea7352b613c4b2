use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use shatter_admin::{AdminCommand, AdminHandler, AdminResponse, AdminServer, ResponseData};

struct Counter {
    restores_requested: usize,
}

impl AdminHandler for Counter {
    fn handle_command(&mut self, cmd: AdminCommand) -> AdminResponse {
        match cmd {
            AdminCommand::Ping => AdminResponse::pong(),
            AdminCommand::RestoreAll => {
                self.restores_requested += 1;
                AdminResponse::queued("restore all")
            }
            _ => AdminResponse::error("unsupported"),
        }
    }
}

#[tokio::test]
async fn test_round_trip_over_tcp() {
    let handler = Arc::new(Mutex::new(Counter { restores_requested: 0 }));
    let server = AdminServer::bind(handler.clone(), "127.0.0.1:0").await.unwrap();
    let addr = server.local_addr().unwrap();

    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"{\"cmd\":\"Ping\"}\n\n{\"cmd\":\"RestoreAll\"}\nnot json\n").await.unwrap();

    let pong: AdminResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(pong, AdminResponse::pong());

    let queued: AdminResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert_eq!(
        queued,
        AdminResponse::ok(ResponseData::Queued { description: "restore all".into() })
    );

    let error: AdminResponse = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
    assert!(matches!(error, AdminResponse::Error { .. }));

    assert_eq!(handler.lock().await.restores_requested, 1);
}
