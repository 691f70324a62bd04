mod rollout_test;
