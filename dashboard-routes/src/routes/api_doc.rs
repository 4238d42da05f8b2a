pub mod examples {
    pub mod audience {
        use serde_json::{Value, json};

        pub fn complete_run() -> Value {
            json!({
                "run": "01890a5d-ac96-774b-bcce-b302099a8057",
                "own_post_count": 2,
                "tagged_post_count": 1,
                "batches": [
                    {
                        "post": "DJxJ81a",
                        "source": "own",
                        "likers": [
                            {"username": "ayse.k", "full_name": "Ayşe K."},
                            {"username": "mehmet_c", "full_name": "Mehmet C."},
                        ],
                    },
                    {
                        "post": "DKa77b2",
                        "source": "own",
                        "likers": [{"username": "ayse.k", "full_name": "Ayşe K."}],
                    },
                    {
                        "post": "DLq90c3",
                        "source": "tagged",
                        "likers": [{"username": "deniz", "full_name": "Deniz A."}],
                    },
                ],
                "failures": [],
            })
        }

        pub fn partial_run() -> Value {
            json!({
                "run": "01890a5d-ac96-774b-bcce-b302099a8058",
                "own_post_count": 2,
                "tagged_post_count": 0,
                "batches": [
                    {
                        "post": "DJxJ81a",
                        "source": "own",
                        "likers": [{"username": "ayse.k", "full_name": "Ayşe K."}],
                    },
                ],
                "failures": [
                    {
                        "post": "DKa77b2",
                        "source": "own",
                        "reason": "the upstream request could not be sent",
                    },
                ],
            })
        }
    }

    pub mod analysis {
        use serde_json::{Value, json};

        pub fn ranked() -> Value {
            json!({
                "run": "01890a5d-ac96-774b-bcce-b302099a8059",
                "top_likers": [
                    {"username": "ayse.k", "full_name": "Ayşe K.", "like_count": 3},
                    {"username": "mehmet_c", "full_name": "Mehmet C.", "like_count": 1},
                ],
                "warm_audience": [
                    {"username": "deniz", "full_name": "Deniz A."},
                ],
                "incomplete_batches": 0,
            })
        }
    }
}
