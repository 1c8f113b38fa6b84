use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use mspbridge_client::messages::{codes, Status};
use mspbridge_client::{ClientError, MspClient};
use mspbridge_device::{AbandonReason, Device, DeviceConfig};
use mspbridge_frame::{encode_frame, Direction, MspCodec};
use tokio::io::AsyncWriteExt;
use tokio_util::codec::FramedRead;

/// Spawn a flight controller that answers each request with `respond(code, payload)`.
/// `None` leaves the request unanswered.
fn start<F>(respond: F) -> MspClient
where
    F: Fn(u8, &[u8]) -> Option<Vec<u8>> + Send + 'static,
{
    let (near, far) = tokio::io::duplex(1024);
    let config = DeviceConfig {
        default_wait: Duration::from_millis(200),
    };
    let (device, _task) = Device::spawn(near, config);

    tokio::spawn(async move {
        let (rd, mut wr) = tokio::io::split(far);
        let mut requests = FramedRead::new(rd, MspCodec::new());
        while let Some(Ok(frame)) = requests.next().await {
            if let Some(reply) = respond(frame.code, &frame.payload) {
                let mut buf = BytesMut::new();
                encode_frame(Direction::Response, frame.code, &reply, &mut buf).unwrap();
                wr.write_all(&buf).await.unwrap();
            }
        }
    });

    MspClient::new(device)
}

#[tokio::test]
async fn status_query_decodes_reply() {
    let client = start(|code, _| {
        (code == codes::STATUS).then(|| vec![0xE8, 0x03, 0, 0, 0x03, 0, 0, 0, 0, 0, 1])
    });

    let status: Status = client.status().await.unwrap();
    assert_eq!(status.cycle_time, 1000);
    assert_eq!(status.sensor_present, 3);
    assert_eq!(status.current_setting, 1);
}

#[tokio::test]
async fn command_payload_reaches_device() {
    let client = start(|code, payload| {
        assert_eq!(code, codes::SET_HEAD);
        assert_eq!(payload, &(-45i16).to_le_bytes());
        Some(Vec::new())
    });

    client.set_head(-45).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn unanswered_query_is_abandoned() {
    let client = start(|_, _| None);

    let err = client.attitude().await.unwrap_err();
    assert!(matches!(err, ClientError::Abandoned(AbandonReason::Timeout)));
}

#[tokio::test]
async fn short_reply_is_reported() {
    let client = start(|_, _| Some(vec![1, 2, 3]));

    let err = client.ident().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::ShortPayload {
            code: 100,
            expected: 7,
            actual: 3
        }
    ));
}

#[tokio::test]
async fn raw_returns_payload_bytes() {
    let client = start(|code, _| Some(vec![code, 0x42]));

    let payload = client.raw(150, Vec::new()).await.unwrap();
    assert_eq!(payload.as_ref(), &[150, 0x42]);
}
