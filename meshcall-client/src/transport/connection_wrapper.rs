use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use meshcall_core::{IceCandidate, SdpKind, SessionDescription};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

use crate::error::TransportError;
use crate::media::{LocalTrack, TrackKind};
use crate::transport::{
    CandidateSink, ConnectionState, IceTransportPolicy, PeerTransport, RemoteTrack,
    TransportConfig, TransportEvent, TransportFactory, TransportKey,
};

/// `RTCPeerConnection` towards one remote participant.
pub struct ConnectionWrapper {
    key: TransportKey,
    peer_connection: Arc<RTCPeerConnection>,
    senders: Mutex<HashMap<TrackKind, Arc<RTCRtpSender>>>,
}

impl ConnectionWrapper {
    /// Creates the peer connection and wires its callbacks into `event_tx`.
    pub async fn new(
        key: TransportKey,
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, TransportError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs().map_err(setup_error)?;
        let registry = register_default_interceptors(Registry::new(), &mut m).map_err(setup_error)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: rtc_ice_servers(config),
            ice_transport_policy: match config.policy {
                IceTransportPolicy::All => RTCIceTransportPolicy::All,
                IceTransportPolicy::Relay => RTCIceTransportPolicy::Relay,
            },
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(setup_error)?,
        );

        let state_tx = event_tx.clone();
        let state_key = key.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = state_tx.clone();
                let key = state_key.clone();

                Box::pin(async move {
                    info!("ICE connection state for {key}: {s}");
                    let state = match s {
                        RTCIceConnectionState::New => ConnectionState::New,
                        RTCIceConnectionState::Checking => ConnectionState::Checking,
                        RTCIceConnectionState::Connected | RTCIceConnectionState::Completed => {
                            ConnectionState::Connected
                        }
                        RTCIceConnectionState::Disconnected => ConnectionState::Disconnected,
                        RTCIceConnectionState::Failed => ConnectionState::Failed,
                        RTCIceConnectionState::Closed => ConnectionState::Closed,
                        RTCIceConnectionState::Unspecified => return,
                    };
                    post_event(&tx, TransportEvent::StateChanged(key, state));
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let ice_key = key.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let key = ice_key.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Dropping unserializable local candidate for {key}: {e}");
                        return;
                    }
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: init.username_fragment,
                };
                post_event(&tx, TransportEvent::CandidateGenerated(key, candidate));
            })
        }));

        let track_tx = event_tx;
        let track_key = key.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let key = track_key.clone();

                Box::pin(async move {
                    let kind = match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        RTPCodecType::Video => TrackKind::Video,
                        RTPCodecType::Unspecified => return,
                    };
                    debug!("Remote {kind} track from {key}");
                    let remote = RemoteTrack {
                        id: track.id(),
                        kind,
                    };
                    post_event(&tx, TransportEvent::RemoteTrack(key, remote));
                })
            },
        ));

        Ok(Self {
            key,
            peer_connection,
            senders: Mutex::new(HashMap::new()),
        })
    }
}

fn rtc_ice_servers(config: &TransportConfig) -> Vec<RTCIceServer> {
    config
        .ice_servers
        .iter()
        .map(|server| RTCIceServer {
            urls: server.urls.clone(),
            username: server.username.clone().unwrap_or_default(),
            credential: server.credential.clone().unwrap_or_default(),
        })
        .collect()
}

/// Queues `event` for the room actor without waiting. Callbacks run on the
/// webrtc tasks and must not block ICE gathering.
fn post_event(tx: &mpsc::Sender<TransportEvent>, event: TransportEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!("Transport event queue full, dropping {:?}", event);
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!("Room is gone, dropping transport event");
            false
        }
    }
}

fn setup_error(e: webrtc::Error) -> TransportError {
    TransportError::Setup(e.to_string())
}

fn negotiation_error(e: webrtc::Error) -> TransportError {
    TransportError::Negotiation(e.to_string())
}

#[async_trait]
impl CandidateSink for ConnectionWrapper {
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), TransportError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| TransportError::Candidate(e.to_string()))
    }
}

#[async_trait]
impl PeerTransport for ConnectionWrapper {
    fn key(&self) -> &TransportKey {
        &self.key
    }

    async fn create_offer(&self, ice_restart: bool) -> Result<SessionDescription, TransportError> {
        let options = ice_restart.then(|| RTCOfferOptions {
            ice_restart: true,
            ..Default::default()
        });
        let offer = self
            .peer_connection
            .create_offer(options)
            .await
            .map_err(negotiation_error)?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await
            .map_err(negotiation_error)?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription, TransportError> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(negotiation_error)?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(negotiation_error)?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        let desc = match description.kind {
            SdpKind::Offer => RTCSessionDescription::offer(description.sdp),
            SdpKind::Answer => RTCSessionDescription::answer(description.sdp),
            SdpKind::Pranswer => RTCSessionDescription::pranswer(description.sdp),
            SdpKind::Rollback => {
                return Err(TransportError::Negotiation(
                    "rollback descriptions are not supported".into(),
                ));
            }
        }
        .map_err(negotiation_error)?;

        self.peer_connection
            .set_remote_description(desc)
            .await
            .map_err(negotiation_error)
    }

    async fn publish_track(
        &self,
        stream_id: &str,
        track: &LocalTrack,
    ) -> Result<(), TransportError> {
        let mime_type = match track.kind {
            TrackKind::Audio => MIME_TYPE_OPUS,
            TrackKind::Video => MIME_TYPE_VP8,
        };
        let local: Arc<dyn TrackLocal + Send + Sync> = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: mime_type.to_owned(),
                ..Default::default()
            },
            track.id.clone(),
            stream_id.to_owned(),
        ));

        let mut senders = self.senders.lock().await;
        if let Some(sender) = senders.get(&track.kind) {
            debug!("Replacing {} sender on {} with {}", track.kind, self.key, track.label);
            return sender
                .replace_track(Some(local))
                .await
                .map_err(|e| TransportError::Track(e.to_string()));
        }

        let sender = self
            .peer_connection
            .add_track(local)
            .await
            .map_err(|e| TransportError::Track(e.to_string()))?;

        // RTCP has to be drained for the interceptors to run.
        let rtcp_sender = Arc::clone(&sender);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        senders.insert(track.kind, sender);
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.senders.lock().await.clear();
        self.peer_connection
            .close()
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}

/// Creates a [`ConnectionWrapper`] per session.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebRtcTransportFactory;

#[async_trait]
impl TransportFactory for WebRtcTransportFactory {
    async fn create(
        &self,
        key: TransportKey,
        config: &TransportConfig,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>, TransportError> {
        let wrapper = ConnectionWrapper::new(key, config, events).await?;
        Ok(Box::new(wrapper))
    }
}
