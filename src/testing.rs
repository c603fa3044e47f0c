//! Scripted transport and LedFx payloads shared by the unit tests.

use crate::client::{ClientError, Method, Request, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Answers requests from per-route queues keyed by `"METHOD path"`.
/// The last queued response of a route keeps being served.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Result<String, ClientError>>>>,
    requests: Mutex<Vec<Request>>,
}

fn route(method: &Method, path: &str) -> String {
    format!("{} {}", method, path)
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, response: Result<String, ClientError>) {
        self.routes
            .lock()
            .unwrap()
            .entry(route(&method, path))
            .or_default()
            .push_back(response);
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.push(method, path, Ok(body.to_string()));
    }

    pub fn respond_raw(&self, method: Method, path: &str, body: &str) {
        self.push(method, path, Ok(body.to_string()));
    }

    pub fn fail(&self, method: Method, path: &str) {
        self.push(method, path, Err(ClientError::Connection("connection refused".to_string())));
    }

    /// Drops whatever is scripted for the route.
    pub fn clear(&self, method: Method, path: &str) {
        self.routes.lock().unwrap().remove(&route(&method, path));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == method && request.api_path() == path)
            .collect()
    }

    pub fn forget_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<String, ClientError> {
        let key = route(&request.method, request.api_path());
        self.requests.lock().unwrap().push(request);

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(ClientError::Connection(format!("no route for {}", key))),
        }
    }
}

pub fn v1_config() -> Value {
    json!({
        "config": {
            "audio": {
                "device_index": 0,
                "device_name": "Default",
                "fft_size": 4096,
                "mic_rate": 44100,
                "min_volume": 0.2
            },
            "default_presets": {
                "wavelength(Reactive)": {
                    "sunset-sweep": {"name": "Sunset Sweep"},
                    "reset": {"name": "Reset"}
                },
                "bar": {"p1": {"name": "P1"}}
            },
            "custom_presets": {
                "wavelength(Reactive)": {"my-wave": {"name": "My Wave"}}
            }
        }
    })
}

pub fn v1_info() -> Value {
    json!({
        "url": "http://127.0.0.1:8888",
        "name": "LedFx Controller",
        "version": "0.10.7",
        "developer_mode": false
    })
}

pub fn v1_schema() -> Value {
    json!({
        "devices": {"wled": {"schema": {"properties": {}}}},
        "effects": {
            "wavelength(Reactive)": {
                "schema": {
                    "properties": {
                        "brightness": {"type": "number", "minimum": 0, "maximum": 1},
                        "blur": {"type": "number", "minimum": 0, "maximum": 10, "title": "Blur"},
                        "flip": {"type": "boolean", "title": "Flip"},
                        "gradient_name": {"type": "string", "enum": ["Rainbow", "Dancefloor"]}
                    }
                }
            },
            "bar": {
                "schema": {
                    "properties": {
                        "brightness": {"type": "number", "minimum": 0, "maximum": 1},
                        "blur": {"type": "number", "minimum": 0, "maximum": 10, "title": "Blur"},
                        "mode": {"type": "string", "enum": ["wipe", "bounce"]}
                    }
                }
            }
        }
    })
}

pub fn v1_devices() -> Value {
    json!({
        "status": "success",
        "devices": {
            "wled": {
                "config": {
                    "name": "WLED",
                    "icon_name": "mdi:led-strip",
                    "ip_address": "192.168.1.20",
                    "type": "wled",
                    "pixel_count": 60
                },
                "effect": {
                    "type": "wavelength(Reactive)",
                    "name": "Wavelength",
                    "config": {
                        "brightness": 0.5,
                        "blur": 3.0,
                        "flip": false,
                        "gradient_name": "Rainbow"
                    }
                }
            },
            "strip": {
                "config": {"name": "Strip", "icon_name": "wled", "pixel_count": 30},
                "effect": {}
            }
        }
    })
}

pub fn v1_audio_devices() -> Value {
    json!({
        "active_device_index": 0,
        "devices": {"0": "Default", "1": "Line In"}
    })
}

pub fn scenes() -> Value {
    json!({
        "status": "success",
        "scenes": {
            "party": {"name": "party time", "virtuals": {}},
            "calm": {"virtuals": {}}
        }
    })
}

pub fn v2_config() -> Value {
    json!({
        "configuration_version": "2.1.2",
        "audio": {
            "audio_device": 1,
            "device_index": 1,
            "fft_size": 4096,
            "mic_rate": 44100
        },
        "ledfx_presets": {
            "energy(Reactive)": {"clear": {"name": "Clear"}, "glitter": {"name": "Glitter"}}
        },
        "user_presets": {
            "energy(Reactive)": {"mine": {"name": "Mine"}}
        }
    })
}

pub fn v2_colors() -> Value {
    json!({
        "colors": {
            "builtin": {"red": "#ff0000", "white": "#ffffff", "black": "#000000"},
            "user": {"salmon": "#ea7d7e"}
        },
        "gradients": {
            "builtin": {"Rainbow": "linear-gradient(90deg, #ff0000 0%, #0000ff 100%)"},
            "user": {"Sunset": "linear-gradient(90deg, #ff8800 0%, #880088 100%)"}
        }
    })
}

pub fn v2_schema() -> Value {
    json!({
        "devices": {},
        "effects": {
            "energy(Reactive)": {
                "schema": {
                    "properties": {
                        "brightness": {"type": "number", "minimum": 0, "maximum": 1},
                        "background_color": {"type": "color", "gradient": false},
                        "color_lows": {"type": "color", "gradient": false, "title": "Color Lows"},
                        "gradient": {"type": "color", "gradient": true, "title": "Gradient"},
                        "sensitivity": {"type": "number", "minimum": 0.3, "maximum": 0.99},
                        "mixing_mode": {"type": "string", "enum": ["overlap", "additive"]}
                    }
                }
            }
        },
        "audio": {
            "schema": {
                "properties": {
                    "audio_device": {"enum": {"0": "Default", "1": "Line In"}}
                }
            }
        }
    })
}

pub fn v2_devices() -> Value {
    json!({
        "status": "success",
        "devices": {
            "wled-dev": {
                "type": "wled",
                "config": {"ip_address": "192.168.1.30", "name": "WLED Dev"}
            }
        }
    })
}

pub fn v2_virtuals() -> Value {
    json!({
        "status": "success",
        "paused": false,
        "virtuals": {
            "wled-1": {
                "is_device": "wled-dev",
                "config": {"name": "Living room", "icon_name": "mdi:television"},
                "effect": {
                    "type": "energy(Reactive)",
                    "config": {
                        "brightness": 1.0,
                        "background_color": "#000000",
                        "color_lows": "#ff0000",
                        "gradient": "linear-gradient(90deg, #ff0000 0%, #0000ff 100%)",
                        "sensitivity": 0.6,
                        "mixing_mode": "additive"
                    }
                }
            },
            "desk": {
                "config": {"name": "Desk"},
                "effect": {}
            }
        }
    })
}

pub fn script_v1(transport: &ScriptedTransport) {
    transport.respond(Method::GET, "config", v1_config());
    transport.respond(Method::GET, "info", v1_info());
    transport.respond(Method::GET, "schema", v1_schema());
    transport.respond(Method::GET, "devices", v1_devices());
    transport.respond(Method::GET, "audio/devices", v1_audio_devices());
    transport.respond(Method::GET, "scenes", scenes());
}

pub fn script_v2(transport: &ScriptedTransport) {
    transport.respond(Method::GET, "config", v2_config());
    transport.respond(Method::GET, "colors", v2_colors());
    transport.respond(Method::GET, "schema", v2_schema());
    transport.respond(Method::GET, "devices", v2_devices());
    transport.respond(Method::GET, "virtuals", v2_virtuals());
    transport.respond(Method::GET, "scenes", scenes());
}
